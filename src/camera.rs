//! Camera types, orbit controller and uniforms for view/projection.
//!
//! The camera orbits a fixed look target: user input feeds angular and zoom
//! velocities into [`OrbitController`], which integrates them once per frame
//! and optionally lets them coast with inertial damping.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::event::{MouseButton, MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keep the orbit shy of the poles so the view never flips.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.02;

/// Shortest distance the camera may zoom towards its target.
const MIN_RADIUS: f32 = 0.05;

/// View state: where the camera sits and what it looks at.
#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new(position: impl Into<Point3<f32>>, target: impl Into<Point3<f32>>) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

/// Perspective projection parameters.
///
/// The aspect ratio is the only field mutated after construction; it tracks
/// the output surface on every resize.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: impl Into<Rad<f32>>, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// View/projection data in the layout the shaders consume.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbit camera controller with optional inertial damping.
///
/// Mouse drag rotates around the target, the wheel zooms. Velocities decay
/// by the damping factor each frame when damping is enabled, so released
/// input coasts to a stop; without damping they are consumed immediately.
#[derive(Debug)]
pub struct OrbitController {
    rotate_speed: f32,
    zoom_speed: f32,
    damping: Option<f32>,
    yaw: f32,
    pitch: f32,
    radius: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
    rotating: bool,
}

impl OrbitController {
    /// Derive the initial orbit from the camera's current placement.
    pub fn new(camera: &Camera, rotate_speed: f32, zoom_speed: f32, damping: Option<f32>) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.magnitude().max(MIN_RADIUS);
        Self {
            rotate_speed,
            zoom_speed,
            damping,
            yaw: offset.z.atan2(offset.x),
            pitch: (offset.y / radius).clamp(-1.0, 1.0).asin(),
            radius,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            rotating: false,
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.rotating = state.is_pressed();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.zoom_velocity -= amount * self.zoom_speed;
            }
            _ => (),
        }
    }

    /// Raw mouse motion, only applied while the rotate button is held.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if !self.rotating {
            return;
        }
        self.yaw_velocity += dx as f32 * self.rotate_speed;
        self.pitch_velocity += dy as f32 * self.rotate_speed;
    }

    /// Integrate one frame of orbital motion and reposition the camera.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();
        self.yaw += self.yaw_velocity * dt;
        self.pitch = (self.pitch + self.pitch_velocity * dt).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.radius = (self.radius * (1.0 + self.zoom_velocity * dt)).max(MIN_RADIUS);

        match self.damping {
            Some(factor) => {
                let decay = 1.0 - factor;
                self.yaw_velocity *= decay;
                self.pitch_velocity *= decay;
                self.zoom_velocity *= decay;
            }
            None => {
                self.yaw_velocity = 0.0;
                self.pitch_velocity = 0.0;
                self.zoom_velocity = 0.0;
            }
        }

        let offset = Vector3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        ) * self.radius;
        camera.position = camera.target + offset;
    }
}
