//! Scene graph and hierarchical scene organization.
//!
//! The scene owns every node for its lifetime: lights, debug helpers and
//! the loaded model root are all children of an anonymous group at the
//! root. Nodes carry a local [`Transform`] composed down the tree when
//! bounding boxes are computed or a frame's [`DrawList`] is collected.

use cgmath::Point3;

use crate::{
    data_structures::{
        model::{Aabb, LineSet, LineVertex, Mesh},
        transform::Transform,
    },
    render::{AmbientLight, DirectionalLight, DrawList, LineDraw, MeshDraw},
};

pub trait SceneNode {
    fn local_transform(&self) -> &Transform;

    fn local_transform_mut(&mut self) -> &mut Transform;

    fn children(&self) -> &[Box<dyn SceneNode>];

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    /// Axis-aligned bounds of this node's subtree in the parent's space.
    ///
    /// `None` for subtrees without geometry (lights, empty groups).
    fn bounding_box(&self, parent: &Transform) -> Option<Aabb>;

    /// Append this subtree's draws to the frame's draw list.
    fn collect<'a>(&'a self, parent: &Transform, out: &mut DrawList<'a>);
}

fn children_bounding_box(
    children: &[Box<dyn SceneNode>],
    world: &Transform,
) -> Option<Aabb> {
    children
        .iter()
        .filter_map(|child| child.bounding_box(world))
        .reduce(Aabb::union)
}

/// A purely organizational node.
pub struct GroupNode {
    transform: Transform,
    children: Vec<Box<dyn SceneNode>>,
}

impl GroupNode {
    pub fn new() -> Self {
        Self {
            transform: Transform::default(),
            children: Vec::new(),
        }
    }
}

impl Default for GroupNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNode for GroupNode {
    fn local_transform(&self) -> &Transform {
        &self.transform
    }

    fn local_transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn bounding_box(&self, parent: &Transform) -> Option<Aabb> {
        let world = parent * &self.transform;
        children_bounding_box(&self.children, &world)
    }

    fn collect<'a>(&'a self, parent: &Transform, out: &mut DrawList<'a>) {
        let world = parent * &self.transform;
        for child in &self.children {
            child.collect(&world, out);
        }
    }
}

/// A renderable mesh with optional children (one glTF node's worth).
pub struct MeshNode {
    transform: Transform,
    children: Vec<Box<dyn SceneNode>>,
    mesh: Mesh,
}

impl MeshNode {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            transform: Transform::default(),
            children: Vec::new(),
            mesh,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

impl SceneNode for MeshNode {
    fn local_transform(&self) -> &Transform {
        &self.transform
    }

    fn local_transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn bounding_box(&self, parent: &Transform) -> Option<Aabb> {
        let world = parent * &self.transform;
        let own = self
            .mesh
            .bounding_box()
            .map(|aabb| aabb.transformed(&world.to_matrix()));
        match (own, children_bounding_box(&self.children, &world)) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    fn collect<'a>(&'a self, parent: &Transform, out: &mut DrawList<'a>) {
        let world = parent * &self.transform;
        out.meshes.push(MeshDraw {
            transform: world.clone(),
            mesh: &self.mesh,
        });
        for child in &self.children {
            child.collect(&world, out);
        }
    }
}

macro_rules! leaf_node {
    ($ty:ty) => {
        impl SceneNode for $ty {
            fn local_transform(&self) -> &Transform {
                &self.transform
            }

            fn local_transform_mut(&mut self) -> &mut Transform {
                &mut self.transform
            }

            fn children(&self) -> &[Box<dyn SceneNode>] {
                &[]
            }

            fn add_child(&mut self, _child: Box<dyn SceneNode>) {
                log::warn!(
                    "{} is a leaf node, the child was dropped",
                    stringify!($ty)
                );
            }

            fn bounding_box(&self, _parent: &Transform) -> Option<Aabb> {
                None
            }

            fn collect<'a>(&'a self, parent: &Transform, out: &mut DrawList<'a>) {
                self.collect_leaf(parent, out);
            }
        }
    };
}

/// Uniform base lighting applied to every mesh.
pub struct AmbientLightNode {
    transform: Transform,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl AmbientLightNode {
    pub fn new(color: [f32; 3], intensity: f32) -> Self {
        Self {
            transform: Transform::default(),
            color,
            intensity,
        }
    }

    fn collect_leaf<'a>(&'a self, _parent: &Transform, out: &mut DrawList<'a>) {
        out.ambient = Some(AmbientLight {
            color: self.color,
            intensity: self.intensity,
        });
    }
}

leaf_node!(AmbientLightNode);

/// A sun-style light shining from its position towards the origin.
pub struct DirectionalLightNode {
    transform: Transform,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl DirectionalLightNode {
    pub fn new(color: [f32; 3], intensity: f32, position: cgmath::Vector3<f32>) -> Self {
        Self {
            transform: Transform::from(position),
            color,
            intensity,
        }
    }

    fn collect_leaf<'a>(&'a self, parent: &Transform, out: &mut DrawList<'a>) {
        let world = parent * &self.transform;
        out.directional = Some(DirectionalLight {
            position: Point3::new(world.position.x, world.position.y, world.position.z),
            color: self.color,
            intensity: self.intensity,
        });
    }
}

leaf_node!(DirectionalLightNode);

/// Debug helper drawing the three axes as colored lines from the origin.
pub struct AxesHelperNode {
    transform: Transform,
    lines: LineSet,
}

impl AxesHelperNode {
    pub fn new(size: f32) -> Self {
        let axes = [
            ([size, 0.0, 0.0], [1.0, 0.2, 0.2]),
            ([0.0, size, 0.0], [0.2, 1.0, 0.2]),
            ([0.0, 0.0, size], [0.2, 0.2, 1.0]),
        ];
        let vertices = axes
            .iter()
            .flat_map(|(end, color)| {
                [
                    LineVertex {
                        position: [0.0, 0.0, 0.0],
                        color: *color,
                    },
                    LineVertex {
                        position: *end,
                        color: *color,
                    },
                ]
            })
            .collect();
        Self {
            transform: Transform::default(),
            lines: LineSet::new("axes_helper", vertices),
        }
    }

    fn collect_leaf<'a>(&'a self, parent: &Transform, out: &mut DrawList<'a>) {
        out.lines.push(LineDraw {
            transform: parent * &self.transform,
            lines: &self.lines,
        });
    }
}

leaf_node!(AxesHelperNode);

/// Debug helper drawing a square grid in the ground (XZ) plane.
pub struct GridHelperNode {
    transform: Transform,
    lines: LineSet,
}

impl GridHelperNode {
    pub fn new(size: f32, divisions: u32) -> Self {
        let divisions = divisions.max(1);
        let step = size / divisions as f32;
        let half = size / 2.0;
        let mut vertices = Vec::with_capacity(((divisions + 1) * 4) as usize);
        for i in 0..=divisions {
            let offset = -half + i as f32 * step;
            // center lines darker, like the usual grid helpers
            let color = if offset == 0.0 {
                [0.27, 0.27, 0.27]
            } else {
                [0.53, 0.53, 0.53]
            };
            vertices.push(LineVertex {
                position: [offset, 0.0, -half],
                color,
            });
            vertices.push(LineVertex {
                position: [offset, 0.0, half],
                color,
            });
            vertices.push(LineVertex {
                position: [-half, 0.0, offset],
                color,
            });
            vertices.push(LineVertex {
                position: [half, 0.0, offset],
                color,
            });
        }
        Self {
            transform: Transform::default(),
            lines: LineSet::new("grid_helper", vertices),
        }
    }

    fn collect_leaf<'a>(&'a self, parent: &Transform, out: &mut DrawList<'a>) {
        out.lines.push(LineDraw {
            transform: parent * &self.transform,
            lines: &self.lines,
        });
    }
}

leaf_node!(GridHelperNode);

/// The scene: a background color and the node tree rooted at a group.
pub struct Scene {
    pub background: wgpu::Color,
    root: GroupNode,
}

impl Scene {
    pub fn new(background: wgpu::Color) -> Self {
        Self {
            background,
            root: GroupNode::new(),
        }
    }

    pub fn add(&mut self, node: Box<dyn SceneNode>) {
        self.root.add_child(node);
    }

    pub fn root(&self) -> &dyn SceneNode {
        &self.root
    }

    /// Bounds of everything with geometry in the scene.
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.root.bounding_box(&Transform::default())
    }

    /// Flatten the tree into this frame's draws.
    pub fn draw_list(&self) -> DrawList<'_> {
        let mut out = DrawList::default();
        self.root.collect(&Transform::default(), &mut out);
        out
    }
}

/// Shift a node so its subtree's bounding box is centered on the origin.
///
/// No-op for subtrees without geometry.
pub fn center_on_origin(node: &mut dyn SceneNode) -> Option<Aabb> {
    let aabb = node.bounding_box(&Transform::default())?;
    let center = aabb.center();
    let position = &mut node.local_transform_mut().position;
    position.x -= center.x;
    position.y -= center.y;
    position.z -= center.z;
    Some(aabb)
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

    use super::*;
    use crate::data_structures::model::ModelVertex;

    fn cube_mesh(center: [f32; 3], half: f32) -> Mesh {
        let mut vertices = Vec::new();
        for dx in [-half, half] {
            for dy in [-half, half] {
                for dz in [-half, half] {
                    vertices.push(ModelVertex {
                        position: [center[0] + dx, center[1] + dy, center[2] + dz],
                        normal: [0.0, 1.0, 0.0],
                    });
                }
            }
        }
        Mesh::new("cube", vertices, (0u32..8).collect())
    }

    #[test]
    fn subtree_bounds_compose_transforms() {
        let mut child = MeshNode::new(cube_mesh([0.0, 0.0, 0.0], 1.0));
        child.local_transform_mut().position = Vector3::new(0.0, 5.0, 0.0);

        let mut root = GroupNode::new();
        root.local_transform_mut().position = Vector3::new(2.0, 0.0, 0.0);
        root.add_child(Box::new(child));

        let aabb = root.bounding_box(&Transform::default()).unwrap();
        assert_eq!(aabb.center(), Point3::new(2.0, 5.0, 0.0));
    }

    #[test]
    fn centering_moves_box_center_to_origin() {
        let mut node = MeshNode::new(cube_mesh([10.0, -4.0, 3.0], 2.0));
        center_on_origin(&mut node).unwrap();

        let recentered = node.bounding_box(&Transform::default()).unwrap();
        assert!(recentered.center().to_vec().magnitude() < 1e-5);
    }

    #[test]
    fn centering_without_geometry_is_a_noop() {
        let mut group = GroupNode::new();
        assert!(center_on_origin(&mut group).is_none());
        assert_eq!(group.local_transform().position, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn draw_list_collects_lights_helpers_and_meshes() {
        let mut scene = Scene::new(wgpu::Color::WHITE);
        scene.add(Box::new(AmbientLightNode::new([1.0, 1.0, 1.0], 0.5)));
        scene.add(Box::new(DirectionalLightNode::new(
            [1.0, 1.0, 1.0],
            1.0,
            Vector3::new(5.0, 10.0, 7.5),
        )));
        scene.add(Box::new(AxesHelperNode::new(5.0)));
        scene.add(Box::new(GridHelperNode::new(10.0, 10)));
        scene.add(Box::new(MeshNode::new(cube_mesh([0.0, 0.0, 0.0], 1.0))));

        let list = scene.draw_list();
        assert_eq!(list.meshes.len(), 1);
        assert_eq!(list.lines.len(), 2);
        assert_eq!(list.ambient.unwrap().intensity, 0.5);
        assert_eq!(
            list.directional.unwrap().position,
            Point3::new(5.0, 10.0, 7.5)
        );
    }

    #[test]
    fn lights_and_helpers_have_no_bounds() {
        let mut scene = Scene::new(wgpu::Color::WHITE);
        scene.add(Box::new(AxesHelperNode::new(5.0)));
        scene.add(Box::new(GridHelperNode::new(10.0, 10)));
        assert!(scene.bounding_box().is_none());
    }
}
