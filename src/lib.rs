//! glb-stage
//!
//! A lightweight, cross-platform staging viewer for single `.glb` models,
//! running natively and on the web. The crate bootstraps a complete viewing
//! stage (scene graph, perspective camera with damped orbit controls, GPU
//! renderer, tolerant async model load with bounding-box recentering, a
//! per-refresh render loop and resize reaction) around a small injectable
//! host seam so the whole flow can be driven without a real window.
//!
//! High-level modules
//! - `app`: the winit event loop driving a stage on a real host
//! - `bootstrap`: the initialization sequence and the shared stage state
//! - `camera`: camera, projection and the damped orbit controller
//! - `context`: central GPU context that owns device/queue/pipelines
//! - `data_structures`: scene graph, transforms, meshes, bounding boxes
//! - `host`: the injectable host environment seam
//! - `pipelines`: definitions for the mesh and helper-line pipelines
//! - `render`: the renderer seam and per-frame draw list
//! - `resources`: asset pre-flight, fetching and glb parsing
//!

pub mod app;
pub mod bootstrap;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod host;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::Color;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
