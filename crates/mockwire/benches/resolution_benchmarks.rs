//! Performance benchmarks for resolution and wiring

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mockwire::{
    default_markers, params, Container, MockDeps, MockProxy, RecordingMocks, TypeDescriptor,
    TypeKey, TypeRegistry,
};
use std::sync::Arc;

trait Cache: Send + Sync {
    fn hit(&self, key: u64) -> bool;
}

impl Cache for MockProxy {
    fn hit(&self, key: u64) -> bool {
        self.invoke("hit", &[&key])
    }
}

struct Service {
    cache: Arc<dyn Cache>,
    name: String,
    fallback: Option<Arc<dyn Cache>>,
}

fn registry() -> Arc<TypeRegistry> {
    Arc::new(
        TypeRegistry::new().with(
            TypeDescriptor::of::<Service>()
                .constructor(params![Arc<dyn Cache>, String], |args| {
                    Ok(Service {
                        cache: args.cloned(0)?,
                        name: args.cloned(1)?,
                        fallback: None,
                    })
                })
                .field::<Arc<dyn Cache>, _>("fallback", default_markers(), |service, cache| {
                    service.fallback = Some((*cache).clone());
                    Ok(())
                }),
        ),
    )
}

fn mocks() -> Arc<RecordingMocks> {
    Arc::new(RecordingMocks::new().bind::<Arc<dyn Cache>, _>(|p| p as Arc<dyn Cache>))
}

fn benchmark_fallback_synthesis(c: &mut Criterion) {
    let registry = registry();

    c.bench_function("synthesize_primitive", |b| {
        b.iter(|| {
            let mut container = Container::new(registry.clone(), mocks());
            black_box(container.resolve::<u64>().unwrap())
        })
    });

    c.bench_function("synthesize_proxy", |b| {
        b.iter(|| {
            let mut container = Container::new(registry.clone(), mocks());
            black_box(container.resolve::<Arc<dyn Cache>>().unwrap())
        })
    });
}

fn benchmark_cached_resolution(c: &mut Criterion) {
    let mut container = Container::new(registry(), mocks());
    container.register_type::<Service>();
    container.resolve::<Service>().unwrap();

    c.bench_function("resolve_cached", |b| {
        b.iter(|| black_box(container.resolve_key(&TypeKey::of::<Service>()).unwrap()))
    });
}

fn benchmark_full_build(c: &mut Criterion) {
    let registry = registry();

    c.bench_function("build_wired_subject", |b| {
        b.iter(|| {
            let wired = MockDeps::<Service>::new()
                .using(Container::new(registry.clone(), mocks()))
                .build()
                .unwrap();
            black_box(wired.subject().name.len())
        })
    });

    c.bench_function("build_and_sweep", |b| {
        b.iter(|| {
            let wired = MockDeps::<Service>::new()
                .using(Container::new(registry.clone(), mocks()))
                .build()
                .unwrap();
            wired.subject().cache.hit(black_box(7));
            black_box(wired.reset_all().unwrap())
        })
    });
}

criterion_group!(
    benches,
    benchmark_fallback_synthesis,
    benchmark_cached_resolution,
    benchmark_full_build
);
criterion_main!(benches);
