//! Drives the full bootstrap sequence through the fake host and renderer.

mod common;

use cgmath::EuclideanSpace;
use cgmath::InnerSpace;
use glb_stage::bootstrap::{BootstrapError, StageOptions, initialize};
use glb_stage::host::FramePulse;
use glb_stage::render::Renderer;

use crate::common::test_utils::{CountingRenderer, FakeHost, GlbNode, cube_positions, write_temp_glb};

fn options(model_path: &str) -> StageOptions {
    StageOptions {
        container_id: "stage".to_string(),
        model_path: model_path.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn attaches_a_single_output_sized_to_the_container() {
    let mut host = FakeHost::new("stage", 800, 600);

    let boot = initialize(&mut host, &options("does-not-exist.glb"), |width, height| async move {
        Ok(CountingRenderer::new(width, height))
    })
    .await
    .expect("bootstrap should succeed");

    assert_eq!(host.attachments(), vec![(800, 600)]);
    assert_eq!(boot.stage.borrow().renderer.dimensions(), (800, 600));
}

#[tokio::test]
async fn missing_container_aborts_before_any_renderer_exists() {
    let mut host = FakeHost::new("some-other-container", 800, 600);
    let mut renderer_created = false;

    let result = initialize(&mut host, &options("does-not-exist.glb"), |width, height| {
        renderer_created = true;
        async move { Ok(CountingRenderer::new(width, height)) }
    })
    .await;

    assert!(matches!(result, Err(BootstrapError::SurfaceMissing(id)) if id == "stage"));
    assert!(!renderer_created);
    assert!(host.attachments().is_empty());
    assert!(!host.has_frame_callback());
    assert!(!host.has_resize_listener());
    assert_eq!(host.tick(), None);
}

#[tokio::test]
async fn failed_model_load_still_starts_loop_and_resize_handling() {
    let mut host = FakeHost::new("stage", 800, 600);

    let boot = initialize(&mut host, &options("does-not-exist.glb"), |width, height| async move {
        Ok(CountingRenderer::new(width, height))
    })
    .await
    .expect("a missing asset must not abort initialization");

    assert!(host.has_frame_callback());
    assert!(host.has_resize_listener());
    // helpers and lights carry no geometry, so an empty bounding box means
    // the stage really came up without the model
    assert!(boot.stage.borrow().scene.bounding_box().is_none());

    assert_eq!(host.tick(), Some(FramePulse::Continue));
    assert_eq!(boot.stage.borrow().renderer.renders, 1);
}

#[tokio::test]
async fn loaded_model_is_centered_on_the_origin() {
    let path = write_temp_glb(
        "bootstrap-centering",
        &[GlbNode::at_origin(cube_positions([12.0, -3.0, 7.0], 1.5))],
    );
    let mut host = FakeHost::new("stage", 800, 600);

    let boot = initialize(
        &mut host,
        &options(path.to_str().unwrap()),
        |width, height| async move { Ok(CountingRenderer::new(width, height)) },
    )
    .await
    .expect("bootstrap should succeed");

    let stage = boot.stage.borrow();
    let aabb = stage.scene.bounding_box().expect("the model was loaded");
    assert!(aabb.center().to_vec().magnitude() < 1e-4);
}

#[tokio::test]
async fn resize_updates_camera_aspect_and_renderer_dimensions() {
    let mut host = FakeHost::new("stage", 800, 600);

    let boot = initialize(&mut host, &options("does-not-exist.glb"), |width, height| async move {
        Ok(CountingRenderer::new(width, height))
    })
    .await
    .expect("bootstrap should succeed");

    host.resize(400, 300);

    let stage = boot.stage.borrow();
    assert!((stage.projection.aspect() - 400.0 / 300.0).abs() < f32::EPSILON);
    assert_eq!(stage.renderer.dimensions(), (400, 300));
}

#[tokio::test]
async fn zero_sized_resize_events_are_ignored() {
    let mut host = FakeHost::new("stage", 800, 600);

    let boot = initialize(&mut host, &options("does-not-exist.glb"), |width, height| async move {
        Ok(CountingRenderer::new(width, height))
    })
    .await
    .expect("bootstrap should succeed");

    host.resize(0, 0);

    let stage = boot.stage.borrow();
    assert!((stage.projection.aspect() - 800.0 / 600.0).abs() < f32::EPSILON);
    assert_eq!(stage.renderer.dimensions(), (800, 600));
}

#[tokio::test]
async fn render_loop_runs_every_tick_until_cancelled() {
    let mut host = FakeHost::new("stage", 800, 600);

    let boot = initialize(&mut host, &options("does-not-exist.glb"), |width, height| async move {
        Ok(CountingRenderer::new(width, height))
    })
    .await
    .expect("bootstrap should succeed");

    for _ in 0..120 {
        assert_eq!(host.tick(), Some(FramePulse::Continue));
    }
    assert_eq!(boot.stage.borrow().renderer.renders, 120);

    boot.render_loop.cancel();
    assert_eq!(host.tick(), Some(FramePulse::Stop));
    // the cancelled loop renders nothing further and unschedules itself
    assert_eq!(boot.stage.borrow().renderer.renders, 120);
    assert_eq!(host.tick(), None);
}

#[tokio::test]
async fn orbiting_between_frames_keeps_the_camera_on_target() {
    let mut host = FakeHost::new("stage", 800, 600);

    let boot = initialize(&mut host, &options("does-not-exist.glb"), |width, height| async move {
        Ok(CountingRenderer::new(width, height))
    })
    .await
    .expect("bootstrap should succeed");

    let start = boot.stage.borrow().camera.position;
    for _ in 0..10 {
        host.tick();
    }
    // no input: damping leaves the camera exactly where it started
    let position = boot.stage.borrow().camera.position;
    assert!((position - start).magnitude() < 1e-4);
}
