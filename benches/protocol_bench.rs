use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tn3270r::lib3270::{
    addressing, process_outbound, AidKey, Buffer, Fields, Producer, ScreenSize, CMD_EW, ORDER_IC,
    ORDER_RA, ORDER_SBA, ORDER_SF, WCC_RESTORE,
};
use tn3270r::TerminalConfig;

/// A 24x80 form: one protected label and one unprotected input per row
fn form_frame(len: usize) -> Vec<u8> {
    let mut data = vec![CMD_EW, WCC_RESTORE];
    for row in 0..24 {
        let label = row * 80;
        data.push(ORDER_SBA);
        data.extend_from_slice(&addressing::encode(label, len));
        data.extend_from_slice(&[ORDER_SF, 0x60, 0xD5, 0x81, 0x94, 0x85, 0x7A]);
        data.push(ORDER_SBA);
        data.extend_from_slice(&addressing::encode(label + 20, len));
        data.extend_from_slice(&[ORDER_SF, 0x40]);
        if row == 0 {
            data.push(ORDER_IC);
        }
        data.push(ORDER_RA);
        data.extend_from_slice(&addressing::encode(label + 60, len));
        data.push(0xC1);
    }
    data
}

fn bench_process_outbound(c: &mut Criterion) {
    let mut buffer = Buffer::with_size(ScreenSize::Model2);
    let data = form_frame(buffer.len());

    c.bench_function("process_outbound_form", |b| {
        b.iter(|| {
            buffer.seek(0).unwrap();
            black_box(process_outbound(black_box(&data), &mut buffer)).unwrap();
        })
    });
}

fn bench_build_fields(c: &mut Criterion) {
    let mut buffer = Buffer::with_size(ScreenSize::Model2);
    let data = form_frame(buffer.len());
    process_outbound(&data, &mut buffer).unwrap();

    c.bench_function("build_fields", |b| {
        b.iter(|| black_box(Fields::build(&mut buffer)))
    });
}

fn bench_read_modified(c: &mut Criterion) {
    let mut buffer = Buffer::with_size(ScreenSize::Model2);
    let data = form_frame(buffer.len());
    process_outbound(&data, &mut buffer).unwrap();
    for row in 0..24 {
        buffer.peek_mut(row * 80 + 20).unwrap().attrs.modified = true;
    }
    let fields = Fields::build(&mut buffer);
    let config = TerminalConfig::default();

    c.bench_function("read_modified_all_fields", |b| {
        b.iter(|| {
            let producer = Producer::new(&buffer, &fields, &config);
            black_box(producer.read_modified(AidKey::Enter, black_box(21)))
        })
    });
}

criterion_group!(benches, bench_process_outbound, bench_build_fields, bench_read_modified);
criterion_main!(benches);
