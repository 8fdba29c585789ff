use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use trellis::flow::Flow;
use trellis::handler::HandlerFn;
use trellis::response::Response;
use trellis::router::Router;
use trellis::state::RequestState;

// Simple benchmarks to aid development of the dispatcher

fn populated_router(num_routes: usize) -> Router {
    let mut router = Router::new();
    for i in 0..num_routes {
        router = router.route(
            "GET",
            format!("/test/{}", i),
            HandlerFn::new("static_ok", |_| async move {
                Flow::Complete(Response::text(200, "ok"))
            }),
        );
    }
    router.route(
        "GET",
        "/users/:id",
        HandlerFn::new("param_ok", |state: RequestState| async move {
            let id = state.param("id").unwrap_or("").to_string();
            Flow::Complete(Response::text(200, id))
        }),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime")
}

fn bench_static_route_dispatch(c: &mut Criterion) {
    let rt = runtime();
    let router = populated_router(100);
    c.bench_function("dispatch_static_route", |b| {
        b.iter(|| {
            rt.block_on(router.dispatch(black_box(RequestState::new("GET", "/test/50"))))
        })
    });
}

fn bench_param_route_dispatch(c: &mut Criterion) {
    let rt = runtime();
    let router = populated_router(100);
    c.bench_function("dispatch_param_route", |b| {
        b.iter(|| {
            rt.block_on(router.dispatch(black_box(RequestState::new("GET", "/users/42"))))
        })
    });
}

fn bench_unmatched_dispatch(c: &mut Criterion) {
    let rt = runtime();
    let router = populated_router(100);
    c.bench_function("dispatch_unmatched", |b| {
        b.iter(|| {
            rt.block_on(router.dispatch(black_box(RequestState::new("GET", "/missing/route"))))
        })
    });
}

criterion_group!(
    benches,
    bench_static_route_dispatch,
    bench_param_route_dispatch,
    bench_unmatched_dispatch
);
criterion_main!(benches);
