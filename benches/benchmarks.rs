use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use routrix::{Request, Router};
use std::hint::black_box;

fn noop(ctx: &mut routrix::Context) {
    ctx.response_mut().set_status(204);
}

fn bench_build_router_with_various_routes(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_router");
    for &size in &[100usize, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
            b.iter(|| {
                let router = Router::new();
                for i in 0..n {
                    router.get(&format!("/static/{i}"), noop).unwrap();
                    if i % 10 == 0 {
                        router.get(&format!("/param/{i}/:id"), noop).unwrap();
                    }
                    if i % 50 == 0 {
                        router
                            .get(&format!("/wildcard/{i}/item/*rest"), noop)
                            .unwrap();
                    }
                }
                router.freeze();
                black_box(router);
            });
        });
    }
    group.finish();
}

fn bench_frozen_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("frozen_lookups");
    let size = 5_000;
    let router = Router::new();
    for i in 0..size {
        router.get(&format!("/static/{i}"), noop).unwrap();
        router.get(&format!("/user{i}/:id"), noop).unwrap();
        router
            .get(&format!("/files/{i}/docs/*path"), noop)
            .unwrap();
    }
    router.freeze();

    group.bench_function("lookup_static_last", |b| {
        b.iter(|| {
            black_box(router.dispatch(Request::new("GET", "/static/4999")));
        })
    });

    group.bench_function("lookup_param_last", |b| {
        b.iter(|| {
            black_box(router.dispatch(Request::new("GET", "/user4999/somevalue")));
        })
    });

    group.bench_function("lookup_wildcard_last", |b| {
        b.iter(|| {
            black_box(router.dispatch(Request::new("GET", "/files/4999/docs/a/b/c.txt")));
        })
    });

    group.bench_function("confirmed_negative", |b| {
        b.iter(|| {
            black_box(router.dispatch(Request::new("GET", "/static/never-registered")));
        })
    });
    group.finish();
}

fn bench_api_style_dispatch(c: &mut Criterion) {
    let router = Router::new();
    let api = router.group("/api").group("/v1");
    api.get("/users", noop).unwrap();
    api.post("/users", noop).unwrap();
    api.get("/users/:userId", noop).unwrap();
    api.put("/users/:userId", noop).unwrap();
    api.delete("/users/:userId", noop).unwrap();
    api.get("/users/:userId/posts/:postId", noop).unwrap();
    api.get("/files/*filePath", noop).unwrap();
    router.freeze();

    let mut group = c.benchmark_group("api_style_dispatch");
    group.bench_function("static", |b| {
        b.iter(|| black_box(router.dispatch(Request::new("GET", "/api/v1/users"))))
    });
    group.bench_function("one_param", |b| {
        b.iter(|| black_box(router.dispatch(Request::new("GET", "/api/v1/users/12345"))))
    });
    group.bench_function("two_params", |b| {
        b.iter(|| black_box(router.dispatch(Request::new("GET", "/api/v1/users/12345/posts/67"))))
    });
    group.bench_function("wildcard", |b| {
        b.iter(|| black_box(router.dispatch(Request::new("GET", "/api/v1/files/a/b/c.txt"))))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build_router_with_various_routes,
    bench_frozen_lookups,
    bench_api_style_dispatch
);
criterion_main!(benches);
