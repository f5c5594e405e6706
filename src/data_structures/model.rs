//! CPU-side mesh data and bounding volumes.
//!
//! Meshes hold plain vertex and index arrays; the renderer uploads them to
//! the GPU lazily, keyed by [`Mesh::id`]. Keeping geometry on the CPU side
//! lets the scene graph compute bounding boxes without a device.

use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::{EuclideanSpace, Matrix4, Point3, Transform as _};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Hand out a fresh id for renderer-side buffer caching.
pub(crate) fn next_geometry_id() -> u64 {
    NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed)
}

/// Vertex buffer layout description for a GPU-visible vertex type.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Vertex of helper line geometry: a position with a flat color.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// A named triangle mesh.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    id: u64,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            id: next_geometry_id(),
        }
    }

    /// Stable id used by the renderer to cache GPU buffers.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Axis-aligned bounds of the raw vertex positions, `None` when empty.
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| Point3::from(v.position)))
    }
}

/// A batch of line segments (pairs of [`LineVertex`]) for debug helpers.
#[derive(Debug)]
pub struct LineSet {
    pub name: String,
    pub vertices: Vec<LineVertex>,
    id: u64,
}

impl LineSet {
    pub fn new(name: impl Into<String>, vertices: Vec<LineVertex>) -> Self {
        Self {
            name: name.into(),
            vertices,
            id: next_geometry_id(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Minimal axis-aligned box enclosing a set of points.
///
/// Used to compute the centering translation for a loaded model: the model
/// root is shifted by the negative of its subtree box center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Aabb {
            min: first,
            max: first,
        };
        for p in points {
            aabb.grow(p);
        }
        Some(aabb)
    }

    fn grow(&mut self, p: Point3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(self, other: Aabb) -> Aabb {
        let mut merged = self;
        merged.grow(other.min);
        merged.grow(other.max);
        merged
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    /// Bounds of this box under an affine transform.
    ///
    /// Transforms all eight corners and re-wraps them, so the result stays
    /// axis-aligned (and is generally looser than the transformed geometry).
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Aabb {
        let corners = [
            Point3::new(self.min.x, self.min.y, self.min.z),
            Point3::new(self.max.x, self.min.y, self.min.z),
            Point3::new(self.min.x, self.max.y, self.min.z),
            Point3::new(self.max.x, self.max.y, self.min.z),
            Point3::new(self.min.x, self.min.y, self.max.z),
            Point3::new(self.max.x, self.min.y, self.max.z),
            Point3::new(self.min.x, self.max.y, self.max.z),
            Point3::new(self.max.x, self.max.y, self.max.z),
        ];
        Aabb::from_points(corners.iter().map(|c| matrix.transform_point(*c)))
            .expect("eight corners are never empty")
    }
}
