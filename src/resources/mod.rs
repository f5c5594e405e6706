use crate::data_structures::{
    model::{Mesh, ModelVertex},
    scene_graph::{GroupNode, MeshNode, SceneNode},
    transform::Transform,
};

/**
 * This module contains all logic for loading model assets from external files.
 */
pub mod fetch;

/// Observer for load progress, called with `(bytes loaded, bytes total)`.
///
/// Purely observational: it has no effect on control flow. Total is zero
/// when the host cannot report a size up front.
pub type ProgressObserver<'a> = &'a mut dyn FnMut(u64, u64);

/// Everything that can go wrong between asking for a model and having a
/// scene node for it. All variants are non-fatal to initialization.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// The pre-flight check answered with a non-success HTTP status.
    #[error("asset request failed with status {0}")]
    Status(u16),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("asset not found at {}", .0.display())]
    NotFound(std::path::PathBuf),
    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(target_arch = "wasm32")]
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error(transparent)]
    Parse(#[from] gltf::Error),
}

/// Load a binary glTF model and build its scene-node tree.
///
/// The sequence is fixed: pre-flight existence check, chunked fetch with
/// progress observation, parse, buffer resolution, node conversion. The
/// returned node is the model root; multiple glTF scene roots are wrapped
/// in a single group so the caller always handles exactly one node.
pub async fn load_model_glb(
    file_name: &str,
    progress: Option<ProgressObserver<'_>>,
) -> Result<Box<dyn SceneNode>, LoadError> {
    fetch::preflight(file_name).await?;
    let data = fetch::load_binary(file_name, progress).await?;
    let gltf = gltf::Gltf::from_slice(&data)?;

    // Resolve buffer contents: the embedded blob for .glb, fetches for
    // external URIs (all of them in flight at once).
    let external: Vec<&str> = gltf
        .buffers()
        .filter_map(|buffer| match buffer.source() {
            gltf::buffer::Source::Uri(uri) => Some(uri),
            gltf::buffer::Source::Bin => None,
        })
        .collect();
    let mut fetched = futures::future::try_join_all(
        external.iter().map(|uri| fetch::load_binary(uri, None)),
    )
    .await?
    .into_iter();

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf.blob.as_deref().ok_or(LoadError::Parse(
                    gltf::Error::MissingBlob,
                ))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(_) => {
                buffer_data.push(fetched.next().expect("fetched in buffer order"));
            }
        }
    }

    let mut roots = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            roots.push(to_scene_node(node, &buffer_data));
        }
    }

    let root = if roots.len() == 1 {
        roots.into_iter().next().expect("checked length")
    } else {
        let mut group = GroupNode::new();
        for node in roots {
            group.add_child(node);
        }
        Box::new(group)
    };

    Ok(root)
}

/// Convert one glTF node (and its subtree) into scene nodes.
///
/// Primitives of a mesh are flattened into a single vertex/index array;
/// missing normals stay zeroed, missing indices become sequential.
fn to_scene_node(node: gltf::scene::Node<'_>, buffers: &[Vec<u8>]) -> Box<dyn SceneNode> {
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mut vertices: Vec<ModelVertex> = Vec::new();
            let mut indices: Vec<u32> = Vec::new();
            for primitive in mesh.primitives() {
                let reader =
                    primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
                let base = vertices.len() as u32;
                if let Some(positions) = reader.read_positions() {
                    for position in positions {
                        vertices.push(ModelVertex {
                            position,
                            normal: [0.0; 3],
                        });
                    }
                }
                if let Some(normals) = reader.read_normals() {
                    for (offset, normal) in normals.enumerate() {
                        if let Some(vertex) = vertices.get_mut(base as usize + offset) {
                            vertex.normal = normal;
                        }
                    }
                }
                match reader.read_indices() {
                    Some(raw) => indices.extend(raw.into_u32().map(|index| base + index)),
                    None => indices.extend(base..vertices.len() as u32),
                }
            }
            let name = mesh.name().unwrap_or("unnamed_mesh");
            Box::new(MeshNode::new(Mesh::new(name, vertices, indices)))
        }
        None => Box::new(GroupNode::new()),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    *scene_node.local_transform_mut() = Transform {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };

    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers));
    }

    scene_node
}
