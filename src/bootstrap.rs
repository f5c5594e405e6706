//! Stage bootstrapping.
//!
//! [`initialize`] runs the whole startup sequence once the host is ready:
//! surface lookup, scene-graph construction, renderer creation, the
//! tolerant async model load with bounding-box recentering, orbit controls,
//! the render loop and the resize listener. The only failure that aborts
//! startup is a missing display surface (plus renderer construction, which
//! nothing can degrade around); a failed model load is logged and the
//! stage comes up empty.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use cgmath::{Deg, Vector3};
use instant::Duration;

use crate::{
    camera::{Camera, OrbitController, Projection},
    data_structures::scene_graph::{
        AmbientLightNode, AxesHelperNode, DirectionalLightNode, GridHelperNode, Scene,
        center_on_origin,
    },
    host::{DisplaySurface, FramePulse, HostEnvironment},
    render::Renderer,
    resources::{fetch, load_model_glb},
};

/// Stage configuration. The defaults are the canonical setup: a light gray
/// backdrop, a 75 degree camera at (0, 2, 5) looking at the origin, damped
/// orbit controls and both debug helpers.
#[derive(Clone, Debug)]
pub struct StageOptions {
    /// Identifier of the display surface in the host (the container element
    /// on the web).
    pub container_id: String,
    /// Model location, resolved against the asset root.
    pub model_path: String,
    pub background: wgpu::Color,
    pub camera_position: [f32; 3],
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// `Some(factor)` enables inertial damping on the orbit controls.
    pub damping_factor: Option<f32>,
    /// Adds the axes and grid helpers to the scene.
    pub debug_helpers: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            container_id: "stage".to_string(),
            model_path: "models/model.glb".to_string(),
            background: wgpu::Color {
                r: 0.933,
                g: 0.933,
                b: 0.933,
                a: 1.0,
            },
            camera_position: [0.0, 2.0, 5.0],
            fovy_degrees: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            rotate_speed: 0.005,
            zoom_speed: 0.25,
            damping_factor: Some(0.05),
            debug_helpers: true,
        }
    }
}

/// Startup failures. Everything else degrades instead of failing.
#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    #[error("display surface '{0}' not found")]
    SurfaceMissing(String),
    #[error("renderer construction failed: {0}")]
    Renderer(anyhow::Error),
}

/// Cancellation handle for the render loop.
///
/// The loop re-arms itself every refresh tick until cancelled; real hosts
/// may never cancel, tests and embedders can stop it deterministically.
#[derive(Clone)]
pub struct RenderLoopHandle {
    cancelled: Rc<Cell<bool>>,
}

impl RenderLoopHandle {
    fn new() -> Self {
        Self {
            cancelled: Rc::new(Cell::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Everything the two registered callbacks share: the scene, the camera
/// with its projection and controls, and the renderer.
pub struct Stage<R: Renderer> {
    pub scene: Scene,
    pub camera: Camera,
    pub projection: Projection,
    pub controls: OrbitController,
    pub renderer: R,
}

impl<R: Renderer> Stage<R> {
    /// One frame: advance control damping, then render.
    pub fn frame(&mut self, dt: Duration) -> anyhow::Result<()> {
        self.controls.update(&mut self.camera, dt);
        self.renderer
            .render(&self.scene, &self.camera, &self.projection)
    }

    /// React to new surface dimensions. Zero sizes (minimized windows) are
    /// ignored; the projection keeps its aspect until a real size arrives.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.projection.resize(width, height);
            self.renderer.resize(width, height);
        }
    }
}

/// A successfully bootstrapped stage.
pub struct Bootstrapped<R: Renderer> {
    pub stage: Rc<RefCell<Stage<R>>>,
    pub render_loop: RenderLoopHandle,
}

/// Run the initialization sequence against `host`.
///
/// `make_renderer` receives the surface dimensions and produces the
/// renderer; production passes a wgpu [`crate::context::Context`] factory,
/// tests inject a fake. On success the frame callback and resize listener
/// are registered with the host and the shared stage is returned.
pub async fn initialize<H, R, F, Fut>(
    host: &mut H,
    options: &StageOptions,
    make_renderer: F,
) -> Result<Bootstrapped<R>, BootstrapError>
where
    H: HostEnvironment,
    R: Renderer + 'static,
    F: FnOnce(u32, u32) -> Fut,
    Fut: Future<Output = anyhow::Result<R>>,
{
    let Some(mut surface) = host.find_surface(&options.container_id) else {
        log::error!("display surface '{}' not found", options.container_id);
        return Err(BootstrapError::SurfaceMissing(options.container_id.clone()));
    };
    let (width, height) = surface.dimensions();

    let mut scene = Scene::new(options.background);
    scene.add(Box::new(AmbientLightNode::new([1.0, 1.0, 1.0], 0.5)));
    scene.add(Box::new(DirectionalLightNode::new(
        [1.0, 1.0, 1.0],
        1.0,
        Vector3::new(5.0, 10.0, 7.5),
    )));
    if options.debug_helpers {
        scene.add(Box::new(AxesHelperNode::new(5.0)));
        scene.add(Box::new(GridHelperNode::new(10.0, 10)));
    }

    let camera = Camera::new(options.camera_position, [0.0, 0.0, 0.0]);
    let projection = Projection::new(
        width,
        height,
        Deg(options.fovy_degrees),
        options.znear,
        options.zfar,
    );

    let renderer = make_renderer(width, height)
        .await
        .map_err(BootstrapError::Renderer)?;
    surface.attach_output(width, height);

    // The model is best-effort: a missing or broken asset degrades the
    // stage to lights and helpers, it never stops the loop from starting.
    let mut log_progress = |loaded: u64, total: u64| {
        if total > 0 {
            log::info!(
                "{}% loaded",
                ((loaded as f64 / total as f64) * 100.0).round()
            );
        }
    };
    match load_model_glb(&options.model_path, Some(&mut log_progress)).await {
        Ok(mut model) => {
            if center_on_origin(model.as_mut()).is_none() {
                log::warn!("model '{}' has no geometry to center", options.model_path);
            }
            scene.add(model);
            log::info!("model loaded successfully");
        }
        Err(error) => {
            log::error!("error loading model: {error}");
            log::info!(
                "attempted to load from: {}",
                fetch::resolved_location(&options.model_path)
            );
        }
    }

    let controls = OrbitController::new(
        &camera,
        options.rotate_speed,
        options.zoom_speed,
        options.damping_factor,
    );

    let stage = Rc::new(RefCell::new(Stage {
        scene,
        camera,
        projection,
        controls,
        renderer,
    }));

    let render_loop = RenderLoopHandle::new();
    {
        let stage = stage.clone();
        let handle = render_loop.clone();
        host.schedule_frames(Box::new(move |dt| {
            if handle.is_cancelled() {
                return FramePulse::Stop;
            }
            let mut stage = stage.borrow_mut();
            if let Err(error) = stage.frame(dt) {
                match error.downcast_ref::<wgpu::SurfaceError>() {
                    // Reconfigure the surface if it's lost or outdated
                    Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (width, height) = stage.renderer.dimensions();
                        stage.resize(width, height);
                    }
                    _ => log::error!("unable to render: {error}"),
                }
            }
            FramePulse::Continue
        }));
    }

    {
        let stage = stage.clone();
        host.set_resize_listener(Box::new(move |width, height| {
            stage.borrow_mut().resize(width, height);
        }));
    }

    Ok(Bootstrapped { stage, render_loop })
}
