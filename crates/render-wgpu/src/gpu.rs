use crate::error::RenderError;
use crate::passes::{CubePass, GroundPass, RenderPass, run_passes};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use cubeedit_common::codec::{FACE_BACKGROUND, MAX_GROUND_COORD, MAX_PICKABLE};
use cubeedit_common::{Face, PickSample};
use cubeedit_kernel::InstanceSnapshot;
use cubeedit_render::{GROUND_LEVEL, InstanceSink, PickPixel, PickSurface, RenderView};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Format of the offscreen pick target. 8 bits per channel, read back verbatim.
pub const ID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Row pitch of the one-texel readback buffer.
const READBACK_BYTES: u64 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

pub(crate) const CUBE_INDEX_COUNT: u32 = 36;
pub(crate) const GROUND_INDEX_COUNT: u32 = 6;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    face: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    offset: [f32; 3],
    colour: [f32; 3],
    id: [u8; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct GroundVertex {
    position: [f32; 3],
}

/// Unit cube centred on the origin, four vertices per face so each carries its face id.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    let corners: [(Face, [[f32; 3]; 4]); 6] = [
        (Face::Front, [[-p, -p, p], [p, -p, p], [p, p, p], [-p, p, p]]),
        (Face::Back, [[p, -p, -p], [-p, -p, -p], [-p, p, -p], [p, p, -p]]),
        (Face::Right, [[p, -p, p], [p, -p, -p], [p, p, -p], [p, p, p]]),
        (Face::Left, [[-p, -p, -p], [-p, -p, p], [-p, p, p], [-p, p, -p]]),
        (Face::Top, [[-p, p, p], [p, p, p], [p, p, -p], [-p, p, -p]]),
        (Face::Bottom, [[-p, -p, -p], [p, -p, -p], [p, -p, p], [-p, -p, p]]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(CUBE_INDEX_COUNT as usize);
    for (face, quad) in corners {
        let base = vertices.len() as u16;
        let normal = face.normal().as_vec3().to_array();
        for position in quad {
            vertices.push(Vertex {
                position,
                normal,
                face: face.id() as u32,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Ground quad covering cells `-extent..=extent` on both axes, front-facing from above.
fn ground_mesh(extent: i32) -> (Vec<GroundVertex>, Vec<u16>) {
    let h = extent as f32 + 0.5;
    let y = GROUND_LEVEL;
    let vertices = vec![
        GroundVertex { position: [-h, y, -h] },
        GroundVertex { position: [-h, y, h] },
        GroundVertex { position: [h, y, h] },
        GroundVertex { position: [h, y, -h] },
    ];
    (vertices, vec![0, 1, 2, 2, 3, 0])
}

fn instance_data(snapshot: &InstanceSnapshot) -> Vec<InstanceData> {
    snapshot
        .positions
        .iter()
        .zip(&snapshot.colours)
        .zip(&snapshot.ids)
        .take(MAX_PICKABLE as usize + 1)
        .map(|((position, colour), id)| InstanceData {
            offset: position.as_vec3().to_array(),
            colour: colour.to_array(),
            id: [id[0], id[1], id[2], 0],
        })
        .collect()
}

/// Clear value of the pick target: zero id, background face byte.
fn id_clear() -> wgpu::Color {
    wgpu::Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: FACE_BACKGROUND as f64 / 255.0,
    }
}

/// wgpu voxel renderer with a colour target and an offscreen pick target.
pub struct WgpuRenderer {
    ground: GroundPass,
    cubes: CubePass,
    uniform_buffer: wgpu::Buffer,
    instance_capacity: u32,
    depth_texture: wgpu::TextureView,
    id_texture: wgpu::Texture,
    id_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    /// Build pipelines and targets. Shader or pipeline validation errors are fatal.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        ground_extent: i32,
    ) -> Result<Self, RenderError> {
        let ground_extent = ground_extent.clamp(0, MAX_GROUND_COORD);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals = |label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            })
        };

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let targets = [
            Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            }),
            Some(wgpu::ColorTargetState {
                format: ID_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            }),
        ];
        let depth_stencil = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let cube_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cube_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CUBE_SHADER.into()),
        });

        let cube_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cube_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &cube_shader,
                entry_point: Some("vs_cube"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Uint32,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            3 => Float32x3,
                            4 => Float32x3,
                            5 => Unorm8x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &cube_shader,
                entry_point: Some("fs_cube"),
                compilation_options: Default::default(),
                targets: &targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let ground_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ground_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GROUND_SHADER.into()),
        });

        // No culling: the underside is pickable too.
        let ground_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ground_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ground_shader,
                entry_point: Some("vs_ground"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GroundVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &ground_shader,
                entry_point: Some("fs_ground"),
                compilation_options: Default::default(),
                targets: &targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!(%err, "shader validation failed");
            return Err(RenderError::Shader(err.to_string()));
        }

        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let (ground_verts, ground_indices) = ground_mesh(ground_extent);
        let ground_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ground_vertex_buffer"),
            contents: bytemuck::cast_slice(&ground_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ground_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ground_index_buffer"),
            contents: bytemuck::cast_slice(&ground_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_capacity = 1024u32;
        let instance_buffer = Self::create_instance_buffer(device, instance_capacity);

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pick_readback"),
            size: READBACK_BYTES,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let width = width.max(1);
        let height = height.max(1);
        let depth_texture = Self::create_depth_texture(device, width, height);
        let (id_texture, id_view) = Self::create_id_texture(device, width, height);

        tracing::info!(width, height, ground_extent, "wgpu renderer ready");

        Ok(Self {
            ground: GroundPass {
                pipeline: ground_pipeline,
                globals: globals("ground_globals"),
                vertex_buffer: ground_vertex_buffer,
                index_buffer: ground_index_buffer,
            },
            cubes: CubePass {
                pipeline: cube_pipeline,
                globals: globals("cube_globals"),
                vertex_buffer: cube_vertex_buffer,
                index_buffer: cube_index_buffer,
                instance_buffer,
                instance_count: 0,
            },
            uniform_buffer,
            instance_capacity,
            depth_texture,
            id_texture,
            id_view,
            readback,
            width,
            height,
            surface_format,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.depth_texture = Self::create_depth_texture(device, self.width, self.height);
        let (texture, view) = Self::create_id_texture(device, self.width, self.height);
        self.id_texture = texture;
        self.id_view = view;
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn instance_count(&self) -> u32 {
        self.cubes.instance_count
    }

    /// Replace the instance buffer contents, growing it if needed.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, snapshot: &InstanceSnapshot) {
        let instances = instance_data(snapshot);
        let count = instances.len() as u32;
        if count > self.instance_capacity {
            self.instance_capacity = count.next_power_of_two();
            self.cubes.instance_buffer = Self::create_instance_buffer(device, self.instance_capacity);
            tracing::debug!(capacity = self.instance_capacity, "instance buffer grown");
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.cubes.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        self.cubes.instance_count = count;
        tracing::debug!(count, generation = snapshot.generation, "instances uploaded");
    }

    /// Render one frame into `target` and the pick target: ground, then cubes.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        view: &RenderView,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: view.view_projection().to_cols_array_2d(),
            }),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.1,
                                g: 0.1,
                                b: 0.15,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.id_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(id_clear()),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let passes: [&dyn RenderPass<wgpu::RenderPass<'_>>; 2] = [&self.ground, &self.cubes];
            run_passes(&mut pass, &passes);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copy one texel of the pick target back to the CPU. Blocks until the GPU is done.
    pub fn read_pick(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixel: PickPixel,
    ) -> Result<PickSample, RenderError> {
        if pixel.x >= self.width || pixel.y == 0 || pixel.y > self.height {
            return Err(RenderError::OutOfBounds {
                x: pixel.x,
                y: pixel.y,
                width: self.width,
                height: self.height,
            });
        }
        let row = pixel.texture_row(self.height);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("pick_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.id_texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: pixel.x,
                    y: row,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_BYTES as u32),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..4);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let rgba = {
            let bytes = slice.get_mapped_range();
            [bytes[0], bytes[1], bytes[2], bytes[3]]
        };
        self.readback.unmap();
        Ok(PickSample::from_rgba(rgba))
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn create_id_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pick_id_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ID_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        (texture, view)
    }
}

/// The renderer together with the device and queue it needs, viewed as the
/// session's instance sink and pick surface.
///
/// Picks read the ID target as last rendered: an upload only takes effect on
/// the next `render`, so a click before the next redraw sees pre-edit ids.
pub struct GpuPickTarget<'a> {
    pub renderer: &'a mut WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl InstanceSink for GpuPickTarget<'_> {
    fn upload_instances(&mut self, snapshot: &InstanceSnapshot) {
        self.renderer.upload(self.device, self.queue, snapshot);
    }
}

impl PickSurface for GpuPickTarget<'_> {
    fn read_pick(&mut self, pixel: PickPixel) -> Option<PickSample> {
        match self.renderer.read_pick(self.device, self.queue, pixel) {
            Ok(sample) => Some(sample),
            Err(err) => {
                tracing::error!(%err, "pick read failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeedit_common::Colour;
    use cubeedit_common::codec::encode_index;
    use cubeedit_kernel::World;
    use glam::{IVec3, Vec3};

    #[test]
    fn cube_mesh_faces_carry_ids() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), CUBE_INDEX_COUNT as usize);
        for v in &vertices {
            let face = Face::from_id(v.face as u8).unwrap();
            assert_eq!(face.normal().as_vec3().to_array(), v.normal);
            // Every vertex lies on the plane of its face.
            let n = Vec3::from(v.normal);
            assert!((Vec3::from(v.position).dot(n) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn cube_triangles_wind_outward() {
        let (vertices, indices) = cube_mesh();
        for tri in indices.chunks(3) {
            let a = Vec3::from(vertices[tri[0] as usize].position);
            let b = Vec3::from(vertices[tri[1] as usize].position);
            let c = Vec3::from(vertices[tri[2] as usize].position);
            let n = Vec3::from(vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn ground_quad_faces_up() {
        let (vertices, indices) = ground_mesh(3);
        assert_eq!(indices.len(), GROUND_INDEX_COUNT as usize);
        let a = Vec3::from(vertices[0].position);
        let b = Vec3::from(vertices[1].position);
        let c = Vec3::from(vertices[2].position);
        assert!((b - a).cross(c - a).y > 0.0);
        assert!(vertices.iter().all(|v| v.position[0].abs() == 3.5));
        assert!(vertices.iter().all(|v| v.position[1] == GROUND_LEVEL));
    }

    #[test]
    fn instances_follow_snapshot_order() {
        let mut world = World::seeded();
        world.add_at(IVec3::new(4, 0, -1), Colour::new(0.25, 0.5, 1.0));
        let data = instance_data(&world.snapshot());
        assert_eq!(data.len(), 24);
        assert_eq!(data[0].colour, [0.0, 0.0, 0.0]);
        let last = data[23];
        assert_eq!(last.offset, [4.0, 0.0, -1.0]);
        assert_eq!(last.colour, [0.25, 0.5, 1.0]);
        let id = encode_index(23);
        assert_eq!(last.id, [id[0], id[1], id[2], 0]);
    }

    #[test]
    fn clear_value_reads_as_background() {
        let clear = id_clear();
        let face = (clear.a * 255.0).round() as u8;
        let sample = PickSample::from_rgba([0, 0, 0, face]);
        assert_eq!(sample, PickSample::BACKGROUND);
    }

    #[test]
    fn pod_layouts_are_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 28);
        assert_eq!(std::mem::size_of::<InstanceData>(), 28);
        assert_eq!(READBACK_BYTES, 256);
    }
}
