//! Fakes and asset builders for driving the bootstrap flow without a
//! window, document or GPU.

use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
    rc::Rc,
    time::Duration,
};

use glb_stage::{
    camera::{Camera, Projection},
    data_structures::scene_graph::Scene,
    host::{DisplaySurface, FramePulse, HostEnvironment},
    render::Renderer,
};

/// A display surface that records output attachments.
pub(crate) struct FakeSurface {
    dimensions: Rc<Cell<(u32, u32)>>,
    attachments: Rc<RefCell<Vec<(u32, u32)>>>,
}

impl DisplaySurface for FakeSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions.get()
    }

    fn attach_output(&mut self, width: u32, height: u32) {
        self.attachments.borrow_mut().push((width, height));
    }
}

/// A scripted host: one container with mutable dimensions, manual resize
/// events and manual refresh ticks.
pub(crate) struct FakeHost {
    container_id: String,
    dimensions: Rc<Cell<(u32, u32)>>,
    attachments: Rc<RefCell<Vec<(u32, u32)>>>,
    resize_listener: Option<Box<dyn FnMut(u32, u32)>>,
    frame_callback: Option<Box<dyn FnMut(Duration) -> FramePulse>>,
}

impl FakeHost {
    pub(crate) fn new(container_id: &str, width: u32, height: u32) -> Self {
        Self {
            container_id: container_id.to_string(),
            dimensions: Rc::new(Cell::new((width, height))),
            attachments: Rc::new(RefCell::new(Vec::new())),
            resize_listener: None,
            frame_callback: None,
        }
    }

    pub(crate) fn attachments(&self) -> Vec<(u32, u32)> {
        self.attachments.borrow().clone()
    }

    pub(crate) fn has_resize_listener(&self) -> bool {
        self.resize_listener.is_some()
    }

    pub(crate) fn has_frame_callback(&self) -> bool {
        self.frame_callback.is_some()
    }

    /// Change the container size and fire the resize event.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.dimensions.set((width, height));
        if let Some(listener) = self.resize_listener.as_mut() {
            listener(width, height);
        }
    }

    /// One simulated refresh tick; `None` when no loop is scheduled.
    pub(crate) fn tick(&mut self) -> Option<FramePulse> {
        let pulse = self
            .frame_callback
            .as_mut()
            .map(|callback| callback(Duration::from_millis(16)));
        if pulse == Some(FramePulse::Stop) {
            self.frame_callback = None;
        }
        pulse
    }
}

impl HostEnvironment for FakeHost {
    type Surface = FakeSurface;

    fn find_surface(&mut self, id: &str) -> Option<FakeSurface> {
        (id == self.container_id).then(|| FakeSurface {
            dimensions: self.dimensions.clone(),
            attachments: self.attachments.clone(),
        })
    }

    fn set_resize_listener(&mut self, listener: Box<dyn FnMut(u32, u32)>) {
        self.resize_listener = Some(listener);
    }

    fn schedule_frames(&mut self, callback: Box<dyn FnMut(Duration) -> FramePulse>) {
        self.frame_callback = Some(callback);
    }
}

/// A renderer that only counts frames and tracks its output size.
pub(crate) struct CountingRenderer {
    pub(crate) renders: u32,
    pub(crate) size: (u32, u32),
}

impl CountingRenderer {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            renders: 0,
            size: (width, height),
        }
    }
}

impl Renderer for CountingRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(
        &mut self,
        _scene: &Scene,
        _camera: &Camera,
        _projection: &Projection,
    ) -> anyhow::Result<()> {
        self.renders += 1;
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        self.size
    }
}

/// Node descriptor for [`build_glb`]: vertex positions plus an optional
/// node translation.
pub(crate) struct GlbNode {
    pub(crate) positions: Vec<[f32; 3]>,
    pub(crate) translation: Option<[f32; 3]>,
}

impl GlbNode {
    pub(crate) fn at_origin(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            translation: None,
        }
    }
}

/// Build a minimal binary glTF file: one mesh per node, positions only.
pub(crate) fn build_glb(nodes: &[GlbNode]) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    let mut buffer_views = Vec::new();
    let mut accessors = Vec::new();
    let mut meshes = Vec::new();
    let mut node_json = Vec::new();

    for (index, node) in nodes.iter().enumerate() {
        let offset = bin.len();
        for position in &node.positions {
            for component in position {
                bin.extend_from_slice(&component.to_le_bytes());
            }
        }
        let byte_length = bin.len() - offset;

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for position in &node.positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(position[axis]);
                max[axis] = max[axis].max(position[axis]);
            }
        }

        buffer_views.push(format!(
            r#"{{"buffer":0,"byteOffset":{offset},"byteLength":{byte_length}}}"#
        ));
        accessors.push(format!(
            r#"{{"bufferView":{index},"byteOffset":0,"componentType":5126,"count":{},"type":"VEC3","min":[{},{},{}],"max":[{},{},{}]}}"#,
            node.positions.len(),
            min[0], min[1], min[2],
            max[0], max[1], max[2],
        ));
        meshes.push(format!(
            r#"{{"primitives":[{{"attributes":{{"POSITION":{index}}}}}]}}"#
        ));
        match node.translation {
            Some([x, y, z]) => node_json.push(format!(
                r#"{{"mesh":{index},"translation":[{x},{y},{z}]}}"#
            )),
            None => node_json.push(format!(r#"{{"mesh":{index}}}"#)),
        }
    }

    let scene_nodes = (0..nodes.len())
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let json = format!(
        r#"{{"asset":{{"version":"2.0"}},"buffers":[{{"byteLength":{}}}],"bufferViews":[{}],"accessors":[{}],"meshes":[{}],"nodes":[{}],"scenes":[{{"nodes":[{}]}}],"scene":0}}"#,
        bin.len(),
        buffer_views.join(","),
        accessors.join(","),
        meshes.join(","),
        node_json.join(","),
        scene_nodes,
    );

    let mut json_bytes = json.into_bytes();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(&0x4654_6C67_u32.to_le_bytes()); // "glTF"
    glb.extend_from_slice(&2_u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F_534A_u32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(&json_bytes);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E_4942_u32.to_le_bytes()); // "BIN\0"
    glb.extend_from_slice(&bin);
    glb
}

/// Write a built glb into the temp directory and return its absolute path.
pub(crate) fn write_temp_glb(name: &str, nodes: &[GlbNode]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "glb-stage-test-{}-{name}.glb",
        std::process::id()
    ));
    std::fs::write(&path, build_glb(nodes)).expect("failed to write test asset");
    path
}

/// Eight corners of an axis-aligned cube, handy as off-center geometry.
pub(crate) fn cube_positions(center: [f32; 3], half: f32) -> Vec<[f32; 3]> {
    let mut positions = Vec::new();
    for dx in [-half, half] {
        for dy in [-half, half] {
            for dz in [-half, half] {
                positions.push([center[0] + dx, center[1] + dy, center[2] + dz]);
            }
        }
    }
    positions
}
