use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Map, Value};

use dbl_core::{normalize, reconcile, NormalizedCatalog, RawCatalog, SelectionSnapshot};

fn generated_catalog(groups: usize, per_group: usize) -> Value {
    let mut root = Map::new();
    for g in 0..groups {
        let mut group = Map::new();
        for i in 0..per_group {
            group.insert(
                format!("list_{i}"),
                json!({
                    "source": format!("https://lists.example.com/{g}/{i}.txt"),
                    "homepage": "https://lists.example.com/",
                }),
            );
        }
        root.insert(format!("group_{g}"), Value::Object(group));
    }
    Value::Object(root)
}

fn bench_normalize(c: &mut Criterion) {
    let raw = RawCatalog::from_value(generated_catalog(20, 50)).expect("generated catalog");

    c.bench_function("normalize_1000", |b| b.iter(|| normalize(black_box(&raw))));
}

fn bench_reconcile(c: &mut Criterion) {
    let raw = RawCatalog::from_value(generated_catalog(20, 50)).expect("generated catalog");
    let catalog: NormalizedCatalog = normalize(&raw);

    let before: SelectionSnapshot = catalog.keys().enumerate().map(|(i, k)| (k.to_string(), i % 2 == 0)).collect();
    let after: SelectionSnapshot = catalog.keys().enumerate().map(|(i, k)| (k.to_string(), i % 3 == 0)).collect();

    c.bench_function("reconcile_1000", |b| {
        b.iter(|| reconcile(black_box(&before), black_box(&after), &catalog))
    });
}

criterion_group!(benches, bench_normalize, bench_reconcile);
criterion_main!(benches);
