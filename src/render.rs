//! Render composition: the draw list scene nodes flatten into, and the
//! renderer seam the bootstrapper drives.
//!
//! Scene traversal happens on the CPU each frame: nodes push their world
//! transform and geometry into a [`DrawList`], sorted here into the two
//! pipelines this crate renders with (lit meshes and flat-colored helper
//! lines). The [`Renderer`] trait keeps the bootstrap sequence independent
//! of the GPU so the whole flow can be driven by a fake in tests.

use crate::{
    camera::{Camera, Projection},
    data_structures::{
        model::{LineSet, Mesh},
        scene_graph::Scene,
        transform::Transform,
    },
};

/// A mesh draw: world placement plus a borrowed mesh.
pub struct MeshDraw<'a> {
    pub transform: Transform,
    pub mesh: &'a Mesh,
}

/// A helper-line draw: world placement plus borrowed line geometry.
pub struct LineDraw<'a> {
    pub transform: Transform,
    pub lines: &'a LineSet,
}

/// Ambient light contribution gathered from the scene.
#[derive(Clone, Copy, Debug)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Directional light gathered from the scene, lit from `position` towards
/// the origin.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    pub position: cgmath::Point3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Everything one frame draws, collected from a scene traversal.
pub struct DrawList<'a> {
    pub meshes: Vec<MeshDraw<'a>>,
    pub lines: Vec<LineDraw<'a>>,
    pub ambient: Option<AmbientLight>,
    pub directional: Option<DirectionalLight>,
}

impl<'a> Default for DrawList<'a> {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            lines: Vec::new(),
            ambient: None,
            directional: None,
        }
    }
}

/// Output seam between the bootstrap sequence and the GPU.
///
/// The production implementation is [`crate::context::Context`]; tests use
/// a counting fake. Dimensions are the current output buffer size in pixels.
pub trait Renderer {
    /// Resize the output buffer. Callers filter out zero sizes.
    fn resize(&mut self, width: u32, height: u32);

    /// Render one frame of `scene` through `camera`.
    fn render(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        projection: &Projection,
    ) -> anyhow::Result<()>;

    fn dimensions(&self) -> (u32, u32);
}
