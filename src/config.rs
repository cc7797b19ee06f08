//! Configuration Management for TN3270R
//!
//! A property map with change listeners and JSON persistence, plus the
//! validated [`TerminalConfig`] a session is built from.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::lib3270::buffer::{addressing, ScreenSize};

pub const KEY_MODEL: &str = "terminal.model";
pub const KEY_ROWS: &str = "terminal.rows";
pub const KEY_COLS: &str = "terminal.cols";
pub const KEY_MONOCHROME: &str = "terminal.monochrome";
pub const KEY_CELL_WIDTH: &str = "terminal.cellWidth";
pub const KEY_CELL_HEIGHT: &str = "terminal.cellHeight";
pub const KEY_CODEPAGE: &str = "terminal.codepage";

/// Configuration change event
#[derive(Debug, Clone)]
pub struct ConfigChangeEvent {
    pub property_name: String,
    pub old_value: Option<ConfigValue>,
    pub new_value: Option<ConfigValue>,
}

/// Configuration change listener trait
pub trait ConfigChangeListener: Send + Sync {
    fn on_config_changed(&mut self, event: &ConfigChangeEvent);
}

/// Supported configuration value types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl ConfigValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Validated terminal geometry and device characteristics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    pub rows: usize,
    pub cols: usize,
    pub monochrome: bool,
    /// Character cell size reported in Query Replies
    pub cell_width: u8,
    pub cell_height: u8,
    pub codepage: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self::for_model(ScreenSize::Model2)
    }
}

impl TerminalConfig {
    pub fn for_model(size: ScreenSize) -> Self {
        Self {
            rows: size.rows(),
            cols: size.cols(),
            monochrome: false,
            cell_width: 9,
            cell_height: 16,
            codepage: "cp037".to_string(),
        }
    }

    /// Cell count, or `None` when `rows * cols` overflows
    pub fn buffer_size(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |parameter: &str, value: String, reason: &str| ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value,
            reason: reason.to_string(),
        };
        if self.rows == 0 {
            return Err(invalid(KEY_ROWS, self.rows.to_string(), "must be positive"));
        }
        if self.cols == 0 {
            return Err(invalid(KEY_COLS, self.cols.to_string(), "must be positive"));
        }
        if addressing::cell_count(self.rows, self.cols).is_none() {
            return Err(invalid(
                KEY_ROWS,
                format!("{}x{}", self.rows, self.cols),
                "buffer must hold at most 16384 cells",
            ));
        }
        Ok(())
    }
}

/// Property-based session configuration
pub struct SessionConfig {
    properties: HashMap<String, ConfigValue>,
    listeners: Vec<Box<dyn ConfigChangeListener>>,
    session_name: String,
    config_resource: String,
}

impl SessionConfig {
    pub fn new(config_resource: String, session_name: String) -> Self {
        let mut config = Self {
            properties: HashMap::new(),
            listeners: Vec::new(),
            session_name,
            config_resource,
        };
        config.set_defaults();
        config
    }

    fn set_defaults(&mut self) {
        let defaults = TerminalConfig::default();
        self.properties.insert(KEY_MODEL.to_string(), 2i64.into());
        self.properties.insert(KEY_MONOCHROME.to_string(), defaults.monochrome.into());
        self.properties.insert(KEY_CELL_WIDTH.to_string(), (defaults.cell_width as i64).into());
        self.properties.insert(KEY_CELL_HEIGHT.to_string(), (defaults.cell_height as i64).into());
        self.properties.insert(KEY_CODEPAGE.to_string(), defaults.codepage.into());
    }

    pub fn get_string_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(|v| v.as_string().map(|s| s.to_string()))
    }

    pub fn get_string_property_or(&self, key: &str, default: &str) -> String {
        self.get_string_property(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_int_property(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(|v| v.as_integer())
    }

    pub fn get_int_property_or(&self, key: &str, default: i64) -> i64 {
        self.get_int_property(key).unwrap_or(default)
    }

    pub fn get_boolean_property_or(&self, key: &str, default: bool) -> bool {
        self.properties.get(key).and_then(|v| v.as_boolean()).unwrap_or(default)
    }

    /// Set configuration property and fire change event
    pub fn set_property<T: Into<ConfigValue>>(&mut self, key: &str, value: T) {
        let new_value = value.into();
        let old_value = self.properties.insert(key.to_string(), new_value.clone());
        self.fire_change_event(&ConfigChangeEvent {
            property_name: key.to_string(),
            old_value,
            new_value: Some(new_value),
        });
    }

    /// Remove property and fire change event
    pub fn remove_property(&mut self, key: &str) -> Option<ConfigValue> {
        let old_value = self.properties.remove(key)?;
        self.fire_change_event(&ConfigChangeEvent {
            property_name: key.to_string(),
            old_value: Some(old_value.clone()),
            new_value: None,
        });
        Some(old_value)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn add_listener(&mut self, listener: Box<dyn ConfigChangeListener>) {
        self.listeners.push(listener);
    }

    fn fire_change_event(&mut self, event: &ConfigChangeEvent) {
        for listener in &mut self.listeners {
            listener.on_config_changed(event);
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn config_resource(&self) -> &str {
        &self.config_resource
    }

    /// Resolve the terminal geometry
    ///
    /// Explicit `terminal.rows`/`terminal.cols` override the model preset.
    pub fn terminal(&self) -> ConfigResult<TerminalConfig> {
        let model = self.get_int_property_or(KEY_MODEL, 2);
        let size = u8::try_from(model)
            .ok()
            .and_then(ScreenSize::from_model_number)
            .ok_or_else(|| ConfigError::InvalidParameter {
                parameter: KEY_MODEL.to_string(),
                value: model.to_string(),
                reason: "expected a 3278 model between 2 and 5".to_string(),
            })?;

        let mut terminal = TerminalConfig::for_model(size);
        terminal.rows = dimension(self, KEY_ROWS, terminal.rows)?;
        terminal.cols = dimension(self, KEY_COLS, terminal.cols)?;
        terminal.monochrome = self.get_boolean_property_or(KEY_MONOCHROME, false);
        terminal.cell_width = cell_metric(self, KEY_CELL_WIDTH, terminal.cell_width)?;
        terminal.cell_height = cell_metric(self, KEY_CELL_HEIGHT, terminal.cell_height)?;
        terminal.codepage = self.get_string_property_or(KEY_CODEPAGE, &terminal.codepage);
        terminal.validate()?;
        Ok(terminal)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.properties)?)
    }

    /// Merge properties from JSON, firing a change event per key
    pub fn from_json(&mut self, json: &str) -> ConfigResult<()> {
        let loaded: HashMap<String, ConfigValue> = serde_json::from_str(json)?;
        for (key, value) in loaded {
            self.set_property(&key, value);
        }
        Ok(())
    }
}

fn dimension(config: &SessionConfig, key: &str, default: usize) -> ConfigResult<usize> {
    match config.get_int_property(key) {
        None => Ok(default),
        Some(value) => usize::try_from(value).map_err(|_| ConfigError::InvalidParameter {
            parameter: key.to_string(),
            value: value.to_string(),
            reason: "must not be negative".to_string(),
        }),
    }
}

fn cell_metric(config: &SessionConfig, key: &str, default: u8) -> ConfigResult<u8> {
    let value = config.get_int_property_or(key, default as i64);
    u8::try_from(value).map_err(|_| ConfigError::InvalidParameter {
        parameter: key.to_string(),
        value: value.to_string(),
        reason: "must fit in one byte".to_string(),
    })
}

/// Thread-safe configuration wrapper
pub type SharedSessionConfig = Arc<Mutex<SessionConfig>>;

pub fn create_shared_config(config_resource: String, session_name: String) -> SharedSessionConfig {
    Arc::new(Mutex::new(SessionConfig::new(config_resource, session_name)))
}

/// Default config file location
///
/// `TN3270R_CONFIG` wins; otherwise the platform config directory, falling
/// back to `./session.json`.
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var("TN3270R_CONFIG") {
        return PathBuf::from(p);
    }
    match dirs::config_dir() {
        Some(base) => base.join("tn3270r").join("session.json"),
        None => PathBuf::from("session.json"),
    }
}

/// Load a configuration file; a missing file yields the defaults
pub fn load_config(path: &Path, session_name: &str) -> ConfigResult<SessionConfig> {
    let mut config = SessionConfig::new(path.to_string_lossy().to_string(), session_name.to_string());
    if !path.exists() {
        debug!("no configuration at {}, using defaults", path.display());
        return Ok(config);
    }
    let json = fs::read_to_string(path).map_err(|source| ConfigError::FileError {
        path: path.display().to_string(),
        source,
    })?;
    config.from_json(&json)?;
    Ok(config)
}

/// Load the shared configuration from the default path, falling back to defaults on error
pub fn load_shared_config(session_name: String) -> SharedSessionConfig {
    let path = default_config_path();
    match load_config(&path, &session_name) {
        Ok(config) => Arc::new(Mutex::new(config)),
        Err(e) => {
            warn!("ignoring configuration {}: {}", path.display(), e);
            create_shared_config(path.to_string_lossy().to_string(), session_name)
        }
    }
}

/// Write the configuration to its `config_resource` path
pub fn save_config(config: &SessionConfig) -> ConfigResult<()> {
    let path = PathBuf::from(config.config_resource());
    let io_error = |source| ConfigError::FileError {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }
    fs::write(&path, config.to_json()?).map_err(io_error)
}
