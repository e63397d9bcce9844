//! Benchmark: full frame encode, decode, and encode+decode round trip for a
//! representative status message with scalar and array fields.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dccl_codec::{decode_frame, encode_frame, parse, AlgorithmRegistry, Value, ValueMap};

const SCHEMA: &str = r#"
message status {
    id: 4;
    size: 32;
    int depth { min: 0; max: 6000; }
    float temperature { min: -5.0; max: 40.0; precision: 2; }
    enum mode { values: [transit, survey, loiter]; }
    string note { max_length: 8; }
    int samples { min: 0; max: 1000; array_length: 5; }
}
"#;

fn sample_values() -> ValueMap {
    let mut vals = ValueMap::new();
    vals.insert("depth".to_string(), vec![Value::Int(451)]);
    vals.insert("temperature".to_string(), vec![Value::Float(12.75)]);
    vals.insert("mode".to_string(), vec![Value::String("survey".to_string())]);
    vals.insert("note".to_string(), vec![Value::String("ok".to_string())]);
    vals.insert(
        "samples".to_string(),
        vec![
            Value::Int(10),
            Value::Int(20),
            Value::Int(30),
            Value::Int(40),
            Value::Int(50),
        ],
    );
    vals.insert("_time".to_string(), vec![Value::Int(43200)]);
    vals
}

fn bench_roundtrip(c: &mut Criterion) {
    let msg = parse(SCHEMA).expect("parse").remove(0);
    let registry = AlgorithmRegistry::new();

    c.bench_function("encode_frame", |b| {
        b.iter(|| {
            let mut vals = sample_values();
            black_box(encode_frame(&msg, &mut vals, &registry).expect("encode"))
        })
    });

    let mut vals = sample_values();
    let frame = encode_frame(&msg, &mut vals, &registry).expect("encode");

    c.bench_function("decode_frame", |b| {
        b.iter(|| black_box(decode_frame(&msg, black_box(&frame)).expect("decode")))
    });

    c.bench_function("roundtrip", |b| {
        b.iter(|| {
            let mut vals = sample_values();
            let frame = encode_frame(&msg, &mut vals, &registry).expect("encode");
            black_box(decode_frame(&msg, &frame).expect("decode"))
        })
    });
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
