use core::{convert::Infallible, hint::black_box};
use criterion::async_executor::SmolExecutor;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use ferrobatch::{BatchPolicy, Batcher, Runtime, SmolBatcher, TokioBatcher};
use futures::future::join_all;
use std::time::{Duration, Instant};
use tokio::runtime::Builder;

// Number of submissions per benchmark iteration. Every batch size below
// divides it, so each batch seals on `max_count` and no timer ever fires.
const TOTAL_ITEMS: usize = 4096;

const BATCH_SIZES: [usize; 6] = [1, 8, 32, 128, 512, 4096];

fn policy(max_count: usize) -> BatchPolicy {
    BatchPolicy::new(Duration::from_secs(10))
        .with_default_delay(Duration::from_secs(10))
        .with_max_count(max_count)
}

fn build<RT: Runtime>(max_count: usize) -> Batcher<u64, u64, Infallible, RT> {
    Batcher::builder(policy(max_count))
        .process(|items: Vec<u64>| async move { Ok(items.into_iter().map(|x| x ^ 1).collect()) })
        .build()
        .unwrap()
}

/// Submits `TOTAL_ITEMS` concurrently and waits for every result.
async fn submit_all<RT: Runtime>(batcher: &Batcher<u64, u64, Infallible, RT>) {
    let submissions = (0..TOTAL_ITEMS as u64).map(|i| batcher.submit(i));
    for result in join_all(submissions).await {
        black_box(result.unwrap());
    }
}

/// Benchmarks size-sealed batches on a multi-threaded Tokio runtime.
fn bench_max_count_tokio(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokio/max_count");
    group.throughput(Throughput::Elements(TOTAL_ITEMS as u64));

    for max_count in BATCH_SIZES {
        group.bench_function(format!("elems/{}/batch/{}", TOTAL_ITEMS, max_count), |b| {
            let rt = Builder::new_multi_thread().enable_all().build().unwrap();

            b.to_async(&rt).iter_custom(move |iters| async move {
                let batcher: TokioBatcher<u64, u64, Infallible> = build(max_count);
                let start = Instant::now();

                for _ in 0..iters {
                    submit_all(&batcher).await;
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmarks size-sealed batches on the global `smol` executor.
fn bench_max_count_smol(c: &mut Criterion) {
    let mut group = c.benchmark_group("smol/max_count");
    group.throughput(Throughput::Elements(TOTAL_ITEMS as u64));

    for max_count in BATCH_SIZES {
        group.bench_function(format!("elems/{}/batch/{}", TOTAL_ITEMS, max_count), |b| {
            b.to_async(SmolExecutor).iter_custom(move |iters| async move {
                let batcher: SmolBatcher<u64, u64, Infallible> = build(max_count);
                let start = Instant::now();

                for _ in 0..iters {
                    submit_all(&batcher).await;
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmarks explicit flushing: a full round of submissions is sealed by
/// [`Batcher::flush`] rather than by the policy.
fn bench_flush_tokio(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokio/flush");
    group.throughput(Throughput::Elements(TOTAL_ITEMS as u64));

    group.bench_function(format!("elems/{}", TOTAL_ITEMS), |b| {
        let rt = Builder::new_multi_thread()
            .enable_all()
            .worker_threads(1)
            .build()
            .unwrap();

        b.to_async(&rt).iter_custom(|iters| async move {
            let batcher: TokioBatcher<u64, u64, Infallible> = build(TOTAL_ITEMS + 1);
            let start = Instant::now();

            for _ in 0..iters {
                let submissions: Vec<_> =
                    (0..TOTAL_ITEMS as u64).map(|i| batcher.submit(i)).collect();
                batcher.flush();
                for result in join_all(submissions).await {
                    black_box(result.unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_max_count_tokio,
    bench_max_count_smol,
    bench_flush_tokio,
);
criterion_main!(benches);
