use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprite_packer_core::prelude::*;

fn generate_requests(count: usize, min_size: u32, max_size: u32) -> Vec<PackRequest> {
    let mut rng = StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            PackRequest::new(format!("icon_{}", i), w, h)
        })
        .collect()
}

fn bench_shelf_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("shelf_packing");

    for count in [50, 200, 1000] {
        let requests = generate_requests(count, 8, 64);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("pack", count), &requests, |b, requests| {
            b.iter(|| black_box(pack(requests.clone())));
        });

        group.bench_with_input(
            BenchmarkId::new("sort_only", count),
            &requests,
            |b, requests| {
                b.iter(|| {
                    let mut sorted = requests.clone();
                    sort_for_packing(&mut sorted);
                    black_box(sorted)
                });
            },
        );
    }

    group.finish();
}

fn bench_deduplicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("deduplicate");
    let icons: Vec<IconSource> = (0..500)
        .map(|i| {
            let size = 8 + i % 16;
            let svg = format!(
                r#"<svg width="{size}" height="{size}"><rect width="{size}" height="{size}"/></svg>"#
            );
            IconSource::new(format!("icon_{}", i), svg)
        })
        .collect();
    group.throughput(Throughput::Elements(icons.len() as u64));
    group.bench_function("500_icons_16_distinct", |b| {
        b.iter(|| black_box(deduplicate(&icons).map(|t| t.groups().len())))
    });
    group.finish();
}

criterion_group!(benches, bench_shelf_packing, bench_deduplicate);
criterion_main!(benches);
