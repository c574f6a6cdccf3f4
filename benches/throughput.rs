use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use ircd_proto::prefix::Prefix;
use ircd_proto::Message;

fn message_creation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("message");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create_privmsg", |b| {
        b.iter(|| {
            Message::new(
                "PRIVMSG",
                vec!["#channel".to_string(), "Hello world".to_string()],
            )
            .with_prefix(Prefix::parse("sender!user@host"))
        })
    });

    group.finish();
}

fn message_parsing_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    let raw = b"@time=2023-01-01T12:00:00.000Z :sender!user@host PRIVMSG #channel :Hello world";
    group.throughput(Throughput::Bytes(raw.len() as u64));

    group.bench_function("parse_privmsg", |b| {
        b.iter(|| std::str::from_utf8(raw).unwrap().parse::<Message>().unwrap())
    });

    group.finish();
}

criterion_group!(benches, message_creation_benchmark, message_parsing_benchmark);
criterion_main!(benches);
