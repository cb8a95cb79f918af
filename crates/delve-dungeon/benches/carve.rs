use criterion::{Criterion, criterion_group, criterion_main};
use delve_dungeon::{DungeonCatalog, ThemeId, carve, fresh_instance_store, generate_layout};
use std::hint::black_box;

fn bench_layout(c: &mut Criterion) {
    let cat = DungeonCatalog::builtin().unwrap();
    c.bench_function("generate_layout plains", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(generate_layout(&cat, ThemeId::Plains, seed).unwrap())
        })
    });
}

fn bench_carve(c: &mut Criterion) {
    let cat = DungeonCatalog::builtin().unwrap();
    let layout = generate_layout(&cat, ThemeId::Mine, 5005).unwrap();
    c.bench_function("carve mine", |b| {
        b.iter(|| {
            let mut store = fresh_instance_store(&cat, ThemeId::Mine, 5005).unwrap();
            black_box(carve(&layout, &mut store, &cat, ThemeId::Mine).unwrap())
        })
    });
}

criterion_group!(benches, bench_layout, bench_carve);
criterion_main!(benches);
