//! Benchmarks for the primitives `scaleUp`/`scaleDown` hinge on: claim
//! contention against the in-memory store, and instance listing at scale.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use diogenes::domain::{Instance, InstanceStatus};
use diogenes::store::{InstanceFilter, MemoryStateStore, StateStore};
use std::hint::black_box;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn bench_claim_contention(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("put_instance_if_absent");

    for concurrency in [2, 8, 32].iter() {
        group.throughput(Throughput::Elements(*concurrency as u64));
        group.bench_with_input(
            BenchmarkId::new("concurrent_claims", concurrency),
            concurrency,
            |b, &concurrency| {
                b.iter(|| {
                    rt.block_on(async {
                        let store = Arc::new(MemoryStateStore::new());
                        let mut handles = Vec::with_capacity(concurrency);
                        for _ in 0..concurrency {
                            let store = store.clone();
                            handles.push(tokio::spawn(async move {
                                let inst = Instance::claim_placeholder("m", "g5.xlarge", 0);
                                black_box(store.put_instance_if_absent(inst).await.unwrap())
                            }));
                        }
                        for handle in handles {
                            handle.await.unwrap();
                        }
                    })
                });
            },
        );
    }
    group.finish();
}

fn bench_list_instances(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("list_instances");

    for size in [100, 1_000, 10_000].iter() {
        let store = rt.block_on(async {
            let store = MemoryStateStore::new();
            for i in 0..*size {
                let model = format!("model-{i}");
                let mut inst = Instance::claim_placeholder(&model, "g5.xlarge", 0);
                inst.status = InstanceStatus::Ready;
                store.put_instance(inst).await.unwrap();
            }
            store
        });

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("unfiltered", size), size, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    black_box(
                        store
                            .list_instances(InstanceFilter::default())
                            .await
                            .unwrap(),
                    )
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_claim_contention, bench_list_instances);
criterion_main!(benches);
