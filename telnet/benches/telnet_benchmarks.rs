use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mudgate_telnet::{Protocol, TelnetEngine, parse_message};

fn bench_parse_data(c: &mut Criterion) {
    let buf = vec![b'x'; 1024];
    c.bench_function("parse_message/data_1kib", |b| {
        b.iter(|| parse_message(black_box(&buf)))
    });
}

fn bench_parse_negotiation(c: &mut Criterion) {
    let buf = [255u8, 253, 31];
    c.bench_function("parse_message/negotiation", |b| {
        b.iter(|| parse_message(black_box(&buf)))
    });
}

fn bench_engine_start(c: &mut Criterion) {
    c.bench_function("engine/start", |b| {
        b.iter(|| {
            let mut engine = TelnetEngine::new(Protocol::Telnet);
            engine.start();
            black_box(engine.take_outbox());
        })
    });
}

criterion_group!(benches, bench_parse_data, bench_parse_negotiation, bench_engine_start);
criterion_main!(benches);
