mod camera;
pub mod gpu;
pub mod helpers;
pub mod pick;

pub use camera::{CameraMode, CameraPose, CameraRig};

use crate::app::EguiFrameOutput;
use crate::interaction::effects::EffectSystem;
use crate::scene::SceneGraph;
use egui_wgpu::wgpu;
use glam::{Mat4, Vec3};
use gpu::{Globals, Gpu, Instance, Mesh, Vertex};
use std::ops::Range;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

const BACKGROUND_SRGB: [u8; 3] = [0x2c, 0x2c, 0x2c];
const LIGHT_DIR: [f32; 3] = [-0.4, -0.6, -1.0];
const AMBIENT: f32 = 0.45;
const INITIAL_INSTANCE_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("GPU out of memory")]
    OutOfMemory,
}

/// What the viewport draws this frame.
pub struct FrameScene<'a> {
    pub scene: Option<&'a SceneGraph>,
    pub camera: &'a CameraRig,
    pub effects: &'a EffectSystem,
    pub helpers_visible: bool,
}

/// Instance data for one frame with the ranges each draw uses.
#[derive(Debug, Default)]
struct FrameInstances {
    instances: Vec<Instance>,
    scene: Range<u32>,
    marker: Range<u32>,
    particles: Range<u32>,
    ripples: Range<u32>,
}

impl FrameInstances {
    fn build(frame: &FrameScene<'_>) -> Self {
        let mut instances = Vec::new();
        let start = instances.len() as u32;
        if let Some(scene) = frame.scene {
            instances.extend(scene.meshes().iter().map(|mesh| Instance {
                model: Mat4::IDENTITY.to_cols_array_2d(),
                color: mesh.material.base_color,
                emissive: [
                    mesh.material.emissive[0],
                    mesh.material.emissive[1],
                    mesh.material.emissive[2],
                    0.0,
                ],
            }));
        }
        let scene = start..instances.len() as u32;

        let start = instances.len() as u32;
        if frame.helpers_visible {
            instances.push(unlit(
                helpers::origin_marker_transform(),
                helpers::ORIGIN_MARKER_COLOR,
            ));
        }
        let marker = start..instances.len() as u32;

        let start = instances.len() as u32;
        instances.extend(frame.effects.particles().map(|sprite| {
            unlit(
                Mat4::from_translation(sprite.position)
                    * Mat4::from_scale(Vec3::splat(sprite.radius)),
                sprite.color,
            )
        }));
        let particles = start..instances.len() as u32;

        let start = instances.len() as u32;
        instances.extend(frame.effects.ripples().map(|ring| {
            let normal = ring.right.cross(ring.up).normalize_or_zero();
            let model = Mat4::from_cols(
                (ring.right * ring.outer).extend(0.0),
                (ring.up * ring.outer).extend(0.0),
                (normal * ring.outer).extend(0.0),
                ring.center.extend(1.0),
            );
            unlit(model, ring.color)
        }));
        let ripples = start..instances.len() as u32;

        Self {
            instances,
            scene,
            marker,
            particles,
            ripples,
        }
    }
}

fn unlit(model: Mat4, color: [f32; 4]) -> Instance {
    Instance {
        model: model.to_cols_array_2d(),
        color,
        emissive: [0.0, 0.0, 0.0, 1.0],
    }
}

fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub struct RenderContext {
    gpu: Gpu,
    egui_renderer: egui_wgpu::Renderer,
    scene_meshes: Vec<Mesh>,
    helper_buf: wgpu::Buffer,
    helper_count: u32,
    instance_buf: wgpu::Buffer,
    instance_capacity: usize,
}

impl RenderContext {
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let gpu = pollster::block_on(Gpu::new(window))?;
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            egui_wgpu::RendererOptions::default(),
        );
        let lines = helpers::helper_lines();
        let helper_buf = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("helper_lines"),
                contents: bytemuck::cast_slice(&lines),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let instance_buf = create_instance_buffer(&gpu.device, INITIAL_INSTANCE_CAPACITY);
        Ok(Self {
            gpu,
            egui_renderer,
            scene_meshes: Vec::new(),
            helper_buf,
            helper_count: lines.len() as u32,
            instance_buf,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Replaces the GPU copies of the scene meshes. Materials are read per
    /// frame, so only geometry is uploaded here.
    pub fn upload_scene(&mut self, scene: &SceneGraph) {
        self.scene_meshes = scene
            .meshes()
            .iter()
            .map(|mesh| {
                let geometry = &mesh.geometry;
                let vertices: Vec<Vertex> = geometry
                    .positions
                    .iter()
                    .enumerate()
                    .map(|(index, pos)| Vertex {
                        pos: *pos,
                        normal: geometry.normals.get(index).copied().unwrap_or([0.0, 0.0, 1.0]),
                    })
                    .collect();
                self.gpu.create_mesh(&mesh.name, &vertices, &geometry.indices)
            })
            .collect();
        log::info!(
            "Uploaded {} meshes ({} triangles)",
            self.scene_meshes.len(),
            scene.triangle_count()
        );
    }

    fn ensure_instance_capacity(&mut self, count: usize) {
        if count <= self.instance_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        self.instance_buf = create_instance_buffer(&self.gpu.device, capacity);
        self.instance_capacity = capacity;
    }

    pub fn render(&mut self, frame: &FrameScene<'_>, ui: EguiFrameOutput) -> Result<(), RenderError> {
        let globals = Globals {
            view_proj: frame
                .camera
                .view_proj(self.gpu.aspect())
                .to_cols_array_2d(),
            light_dir: LIGHT_DIR,
            ambient: AMBIENT,
        };
        self.gpu
            .queue
            .write_buffer(&self.gpu.globals_buf, 0, bytemuck::bytes_of(&globals));

        let batch = FrameInstances::build(frame);
        self.ensure_instance_capacity(batch.instances.len().max(1));
        if !batch.instances.is_empty() {
            self.gpu.queue.write_buffer(
                &self.instance_buf,
                0,
                bytemuck::cast_slice(&batch.instances),
            );
        }

        let surface_frame = match self.gpu.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = PhysicalSize::new(self.gpu.config.width, self.gpu.config.height);
                self.gpu.resize(size);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(err) => {
                log::warn!("Frame dropped: {:?}", err);
                return Ok(());
            }
        };
        let view = surface_frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("main-encoder"),
            });

        {
            let (color_view, resolve_target) = match &self.gpu.msaa_view {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let [r, g, b] = BACKGROUND_SRGB.map(srgb_to_linear);
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gpu.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_bind_group(0, &self.gpu.bind_group, &[]);

            rpass.set_pipeline(&self.gpu.pipelines.scene);
            rpass.set_vertex_buffer(1, self.instance_buf.slice(..));
            for (mesh, instance) in self.scene_meshes.iter().zip(batch.scene.clone()) {
                rpass.set_vertex_buffer(0, mesh.vbuf.slice(..));
                rpass.set_index_buffer(mesh.ibuf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.count, 0, instance..instance + 1);
            }

            if frame.helpers_visible {
                rpass.set_vertex_buffer(0, self.gpu.octahedron.vbuf.slice(..));
                rpass.set_index_buffer(
                    self.gpu.octahedron.ibuf.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                rpass.draw_indexed(0..self.gpu.octahedron.count, 0, batch.marker.clone());

                rpass.set_pipeline(&self.gpu.pipelines.lines);
                rpass.set_vertex_buffer(0, self.helper_buf.slice(..));
                rpass.draw(0..self.helper_count, 0..1);
            }

            rpass.set_pipeline(&self.gpu.pipelines.effects);
            rpass.set_vertex_buffer(1, self.instance_buf.slice(..));
            if !batch.particles.is_empty() {
                rpass.set_vertex_buffer(0, self.gpu.octahedron.vbuf.slice(..));
                rpass.set_index_buffer(
                    self.gpu.octahedron.ibuf.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                rpass.draw_indexed(0..self.gpu.octahedron.count, 0, batch.particles.clone());
            }
            if !batch.ripples.is_empty() {
                rpass.set_vertex_buffer(0, self.gpu.annulus.vbuf.slice(..));
                rpass.set_index_buffer(self.gpu.annulus.ibuf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..self.gpu.annulus.count, 0, batch.ripples.clone());
            }
        }
        let cmd_main = encoder.finish();

        let screen_desc = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
            pixels_per_point: ui.pixels_per_point,
        };
        let cmd_ui = {
            let mut egui_encoder =
                self.gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("egui-encoder"),
                    });
            for (id, delta) in &ui.textures_delta.set {
                self.egui_renderer
                    .update_texture(&self.gpu.device, &self.gpu.queue, *id, delta);
            }
            let user_buffers = self.egui_renderer.update_buffers(
                &self.gpu.device,
                &self.gpu.queue,
                &mut egui_encoder,
                &ui.clipped_primitives,
                &screen_desc,
            );
            {
                let rpass = egui_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
                let mut rpass = rpass.forget_lifetime();
                self.egui_renderer
                    .render(&mut rpass, &ui.clipped_primitives, &screen_desc);
            }
            for id in &ui.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
            let mut buffers = user_buffers;
            buffers.push(egui_encoder.finish());
            buffers
        };
        self.gpu
            .queue
            .submit(std::iter::once(cmd_main).chain(cmd_ui));
        surface_frame.present();
        Ok(())
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instances"),
        size: (std::mem::size_of::<Instance>() * capacity) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
