//! Central GPU context: device, queue, surface, pipelines and uniforms.
//!
//! `Context` is the production [`Renderer`]: it owns every GPU resource the
//! stage draws with and uploads scene geometry lazily, keyed by the stable
//! geometry ids carried by meshes and line sets.

use std::{collections::HashMap, iter, sync::Arc};

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraUniform, Projection},
    data_structures::{scene_graph::Scene, texture::Texture, transform::Transform},
    pipelines::{
        Pipelines,
        mesh::{LightUniform, mk_light_bind_group_layout},
    },
    render::{DrawList, Renderer},
};

/// GPU-side copy of one mesh or line set plus its per-draw transform.
struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    transform_buffer: wgpu::Buffer,
    count: u32,
}

pub struct Context {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: Texture,
    pipelines: Pipelines,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    light_uniform: LightUniform,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    geometry: HashMap<u64, GpuGeometry>,
}

impl Context {
    pub async fn new(window: Arc<Window>, width: u32, height: u32) -> anyhow::Result<Self> {
        // The instance is a handle to our GPU
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create the render surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;

        log::debug!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to acquire a GPU device")?;

        log::debug!("surface configuration");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders assume an srgb surface; fall back to whatever the
        // adapter offers first when none is available.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let light_uniform = LightUniform::default();
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[light_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_bind_group_layout = mk_light_bind_group_layout(&device);
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });

        let pipelines = Pipelines::new(
            &device,
            &config,
            &camera_bind_group_layout,
            &light_bind_group_layout,
        );

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            pipelines,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            light_uniform,
            light_buffer,
            light_bind_group,
            geometry: HashMap::new(),
        })
    }

    /// Upload geometry on first sight and refresh its per-draw transform.
    fn upload(
        &mut self,
        id: u64,
        transform: &Transform,
        vertices: &[u8],
        indices: Option<&[u32]>,
        count: u32,
        label: &str,
    ) {
        let raw = transform.to_raw();
        let device = &self.device;
        let entry = self.geometry.entry(id).or_insert_with(|| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: vertices,
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = indices.map(|indices| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} Index Buffer")),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
            });
            let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Transform Buffer")),
                contents: bytemuck::cast_slice(&[raw]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            GpuGeometry {
                vertex_buffer,
                index_buffer,
                transform_buffer,
                count,
            }
        });
        self.queue
            .write_buffer(&entry.transform_buffer, 0, bytemuck::cast_slice(&[raw]));
    }

    fn upload_draw_list(&mut self, list: &DrawList<'_>) {
        for draw in &list.meshes {
            self.upload(
                draw.mesh.id(),
                &draw.transform,
                bytemuck::cast_slice(&draw.mesh.vertices),
                Some(&draw.mesh.indices),
                draw.mesh.indices.len() as u32,
                &draw.mesh.name,
            );
        }
        for draw in &list.lines {
            self.upload(
                draw.lines.id(),
                &draw.transform,
                bytemuck::cast_slice(&draw.lines.vertices),
                None,
                draw.lines.vertices.len() as u32,
                &draw.lines.name,
            );
        }
    }
}

impl Renderer for Context {
    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        projection: &Projection,
    ) -> anyhow::Result<()> {
        self.camera_uniform.update_view_proj(camera, projection);
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );

        let list = scene.draw_list();
        if let Some(ambient) = list.ambient {
            self.light_uniform.ambient_color = ambient.color;
            self.light_uniform.ambient_intensity = ambient.intensity;
        }
        if let Some(directional) = list.directional {
            self.light_uniform.position = directional.position.into();
            self.light_uniform.color = directional.color;
            self.light_uniform.intensity = directional.intensity;
        }
        self.queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[self.light_uniform]),
        );

        self.upload_draw_list(&list);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipelines.mesh);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_bind_group(1, &self.light_bind_group, &[]);
            for draw in &list.meshes {
                let Some(gpu) = self.geometry.get(&draw.mesh.id()) else {
                    continue;
                };
                if gpu.count == 0 {
                    continue;
                }
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, gpu.transform_buffer.slice(..));
                if let Some(index_buffer) = &gpu.index_buffer {
                    render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..gpu.count, 0, 0..1);
                }
            }

            render_pass.set_pipeline(&self.pipelines.line);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for draw in &list.lines {
                let Some(gpu) = self.geometry.get(&draw.lines.id()) else {
                    continue;
                };
                if gpu.count == 0 {
                    continue;
                }
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, gpu.transform_buffer.slice(..));
                render_pass.draw(0..gpu.count, 0..1);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
