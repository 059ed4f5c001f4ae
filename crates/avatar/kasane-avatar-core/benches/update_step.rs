use criterion::{criterion_group, criterion_main, Criterion};

use kasane_avatar_core::{Avatar, Config, PlayMode, Transform2D};
use kasane_test_fixtures::{models, motions, RecordingRenderer};

fn bench_update(c: &mut Criterion) {
    let mut renderer = RecordingRenderer::new();
    let mut avatar = Avatar::from_model(
        models::data("mascot").expect("fixture model"),
        &mut renderer,
        Config::default(),
    )
    .expect("avatar should build");
    let idle = motions::data("idle").expect("fixture motion");
    avatar
        .load_motion("idle", (idle.fade_in, idle.fade_out), idle)
        .expect("motion should load");
    avatar
        .set_motion("idle", PlayMode::Loop)
        .expect("motion should start");

    c.bench_function("update_16ms", |b| {
        b.iter(|| avatar.update(1.0 / 60.0));
    });

    let transform = Transform2D::default();
    c.bench_function("update_and_draw_16ms", |b| {
        b.iter(|| {
            avatar.update(1.0 / 60.0);
            renderer.events.clear();
            avatar
                .draw(&mut renderer, &transform)
                .expect("draw should succeed");
        });
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
