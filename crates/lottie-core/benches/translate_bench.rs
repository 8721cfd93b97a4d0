//! Criterion benchmarks for translation.
//!
//! Measures translating documents with a growing number of animated shape
//! layers, with and without annotation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lottie_core::{translate, TranslateOptions};
use lottie_data::model::LottieJson;
use serde_json::json;

/// Generate a document with n shape layers, each holding an ellipse whose
/// size and position are animated.
fn make_document(layers: usize) -> LottieJson {
    let layers: Vec<_> = (0..layers)
        .map(|i| {
            let offset = (i % 50) as f32 * 10.0;
            json!({
                "ty": 4,
                "ind": i + 1,
                "ip": 0,
                "op": 120,
                "nm": format!("Layer {i}"),
                "ks": {
                    "p": { "a": 1, "k": [
                        { "t": 0, "s": [offset, 0, 0], "to": [20, 0, 0], "ti": [0, -20, 0] },
                        { "t": 120, "s": [offset, 400, 0] }
                    ] }
                },
                "shapes": [
                    {
                        "ty": "el",
                        "p": { "a": 0, "k": [0, 0] },
                        "s": { "a": 1, "k": [
                            { "t": 0, "s": [10, 10], "o": { "x": [0.3], "y": [0] }, "i": { "x": [0.7], "y": [1] } },
                            { "t": 120, "s": [60, 60] }
                        ] }
                    },
                    { "ty": "fl", "c": { "a": 0, "k": [0.2, 0.4, 0.8, 1] }, "o": { "a": 0, "k": 100 } }
                ]
            })
        })
        .collect();

    serde_json::from_value(json!({
        "fr": 60,
        "ip": 0,
        "op": 120,
        "w": 512,
        "h": 512,
        "layers": layers
    }))
    .expect("benchmark document")
}

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");

    for count in [1usize, 10, 100] {
        let document = make_document(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("layers", count), &document, |b, doc| {
            b.iter(|| translate(black_box(doc), &TranslateOptions::default()))
        });
    }

    let document = make_document(100);
    let annotate = TranslateOptions {
        annotate: true,
        ..TranslateOptions::default()
    };
    group.bench_function("annotated_100", |b| {
        b.iter(|| translate(black_box(&document), &annotate))
    });

    group.finish();
}

criterion_group!(benches, bench_translate);
criterion_main!(benches);
