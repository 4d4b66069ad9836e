use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pairrank::merger::merge_heaps;
use pairrank::oracle::ComparisonResult;
use pairrank::topk::{BoundedTopKHeap, MAX_RESULTS};

fn worker_heaps(workers: usize) -> Vec<BoundedTopKHeap<ComparisonResult>> {
    (0..workers)
        .map(|w| {
            let mut heap = BoundedTopKHeap::new(MAX_RESULTS);
            for i in 0..MAX_RESULTS * 2 {
                let score = (((w * 7919 + i) as u64).wrapping_mul(2_654_435_761) % 10_000) as f64 / 100.0;
                heap.push(ComparisonResult::new(score, format!("w{}/{}", w, i), "other"));
            }
            heap
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_heaps");
    for workers in [2usize, 8, 32] {
        let heaps = worker_heaps(workers);
        group.bench_with_input(BenchmarkId::from_parameter(workers), &heaps, |b, heaps| {
            b.iter(|| black_box(merge_heaps(heaps.clone())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
