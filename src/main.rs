//! Command line replay tool for TN3270R
//!
//! Feeds outbound frames, given as hex, through a terminal session and
//! prints every inbound reply followed by the final screen.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use log::info;

use tn3270r::config::{default_config_path, load_config, KEY_COLS, KEY_MODEL, KEY_ROWS};
use tn3270r::session::Session;

#[derive(Debug, Default, PartialEq)]
struct Options {
    config_path: Option<PathBuf>,
    model: Option<i64>,
    rows: Option<i64>,
    cols: Option<i64>,
    frames: Vec<Vec<u8>>,
    help: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args)?;
    if options.help {
        print_help();
        return Ok(());
    }

    let path = options.config_path.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&path, "replay")
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    if let Some(model) = options.model {
        config.set_property(KEY_MODEL, model);
    }
    if let Some(rows) = options.rows {
        config.set_property(KEY_ROWS, rows);
    }
    if let Some(cols) = options.cols {
        config.set_property(KEY_COLS, cols);
    }
    let terminal = config.terminal().context("invalid terminal configuration")?;

    let mut session = Session::new(terminal)?;
    info!("replaying {} frame(s) through session {}", options.frames.len(), session.id());
    for (ix, frame) in options.frames.iter().enumerate() {
        let replies = session
            .outbound(frame)
            .with_context(|| format!("outbound frame {}", ix + 1))?;
        for reply in replies {
            println!("{}", to_hex(&reply));
        }
    }
    println!("{}", session.screen_text());
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", name))
        };
        match arg.as_str() {
            "--rows" | "-r" => options.rows = Some(parse_number("--rows", &value("--rows")?)?),
            "--cols" | "-c" => options.cols = Some(parse_number("--cols", &value("--cols")?)?),
            "--model" | "-m" => options.model = Some(parse_number("--model", &value("--model")?)?),
            "--config" => options.config_path = Some(PathBuf::from(value("--config")?)),
            "--hex" | "-x" => options.frames.push(parse_hex(&value("--hex")?)?),
            "--file" | "-f" => {
                let path = value("--file")?;
                let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
                for line in text.lines().map(str::trim) {
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    options.frames.push(parse_hex(line)?);
                }
            }
            "--help" | "-h" => options.help = true,
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(options)
}

fn parse_number(name: &str, value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("{} requires a number, got '{}'", name, value))
}

/// Hex digits with optional whitespace, `:` or `-` separators
fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ':' && *ch != '-')
        .collect();
    if !digits.is_ascii() {
        bail!("non-hex character in '{}'", text);
    }
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits in '{}'", text);
    }
    (0..digits.len())
        .step_by(2)
        .map(|ix| {
            u8::from_str_radix(&digits[ix..ix + 2], 16)
                .with_context(|| format!("invalid hex byte '{}'", &digits[ix..ix + 2]))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_help() {
    println!("TN3270R - IBM 3270 data stream replay");
    println!();
    println!("Usage: tn3270r [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --model <2-5> or -m <n>     Screen model (default: 2, 24x80)");
    println!("  --rows <n> or -r <n>        Override the number of rows");
    println!("  --cols <n> or -c <n>        Override the number of columns");
    println!("  --config <path>             Session configuration file");
    println!("  --hex <frame> or -x <frame> Outbound frame as hex, may be repeated");
    println!("  --file <path> or -f <path>  File of hex frames, one per line");
    println!("  --help or -h                Show this help message");
    println!();
    println!("Example:");
    println!("  tn3270r --model 2 --hex 'F5 C2 1D 60 C8 C9' --hex F6");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("F5 C2 1d").unwrap(), vec![0xF5, 0xC2, 0x1D]);
        assert_eq!(parse_hex("ff:ef").unwrap(), vec![0xFF, 0xEF]);
        assert!(parse_hex("F5C").is_err());
        assert!(parse_hex("ZZ").is_err());
        assert!(parse_hex("é").is_err());
        assert!(parse_hex("Fé0").is_err());
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(&args(&["--model", "3", "--hex", "F1 C2", "-x", "F6"])).unwrap();
        assert_eq!(options.model, Some(3));
        assert_eq!(options.frames, vec![vec![0xF1, 0xC2], vec![0xF6]]);
        assert!(!options.help);

        assert!(parse_args(&args(&["--rows"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x7D, 0x40, 0xFF]), "7D 40 FF");
    }
}
