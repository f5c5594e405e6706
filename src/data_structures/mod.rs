/**
 * Engine data models: meshes, transforms, the scene graph and depth textures.
 */
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
