use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagecapt::capture::{CaptureCoordinator, CaptureEvent};
use pagecapt::engine::Viewport;

fn benchmark_readiness_path(c: &mut Criterion) {
    c.bench_function("coordinator_readiness_path", |b| {
        b.iter(|| {
            let mut coordinator = CaptureCoordinator::new(black_box(0), None);
            coordinator.handle_event(CaptureEvent::LayoutComplete);
            coordinator.handle_event(CaptureEvent::GeometryKnown {
                viewport: Viewport::new(800, 600),
            });
            let action = coordinator.handle_event(CaptureEvent::DocumentComplete { ok: true });
            black_box(action)
        })
    });
}

fn benchmark_alert_scan(c: &mut Criterion) {
    c.bench_function("coordinator_alert_scan", |b| {
        b.iter(|| {
            let mut coordinator =
                CaptureCoordinator::new(0, Some(black_box("capture-now".to_string())));
            for n in 0..100 {
                coordinator.handle_event(CaptureEvent::AlertRaised(format!("noise {}", n)));
            }
            let action =
                coordinator.handle_event(CaptureEvent::AlertRaised("capture-now".to_string()));
            black_box(action)
        })
    });
}

criterion_group!(benches, benchmark_readiness_path, benchmark_alert_scan);
criterion_main!(benches);
