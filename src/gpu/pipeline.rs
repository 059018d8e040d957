/// wgpu render pipeline for the page meshes
///
/// This module manages all the wgpu boilerplate:
/// - Device and queue initialization
/// - Page texture uploads, kept while the page stays on screen
/// - The camera uniform
/// - Offscreen rendering of a frame's draws with depth, read back to RGBA

// Use wgpu from iced to avoid dependency conflicts
use iced_wgpu::wgpu;
use wgpu::util::DeviceExt;

use std::collections::HashMap;
use std::sync::Mutex;

use image::RgbaImage;

use super::scene::{CameraUniform, DrawCall};
use super::shaders;
use super::vertex::{index_bytes, vertex_bytes, PageVertex};
use crate::error::{BookError, Result};
use crate::page::cache::{PageTexture, TextureKey};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A page texture living on the GPU
struct GpuPage {
    epoch: u64,
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// wgpu vertex attributes for `PageVertex`
pub fn vertex_attributes() -> [wgpu::VertexAttribute; 3] {
    PageVertex::ATTRIBUTES.map(|(location, offset, components)| wgpu::VertexAttribute {
        format: match components {
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        },
        offset: offset as wgpu::BufferAddress,
        shader_location: location,
    })
}

/// Rows handed to `copy_texture_to_buffer` must be 256-byte aligned
fn padded_row_bytes(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

pub struct MeshRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    page_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    camera_bind_group: wgpu::BindGroup,
    _camera_buffer: wgpu::Buffer,
    max_dimension: u32,
    /// Uploaded pages, pruned to what the last frame drew
    pages: Mutex<HashMap<TextureKey, GpuPage>>,
}

// Manual Debug implementation (wgpu types don't implement Debug)
impl std::fmt::Debug for MeshRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshRenderer")
            .field("max_dimension", &self.max_dimension)
            .finish_non_exhaustive()
    }
}

impl MeshRenderer {
    /// Find an adapter and build the pipeline
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BookError::Gpu("no suitable GPU adapter".to_string()))?;

        let limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Book Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits.clone(),
                },
                None,
            )
            .await
            .map_err(|e| BookError::Gpu(format!("failed to create device: {:?}", e)))?;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Page Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let page_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Page Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
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
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::top_down()]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Page Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::get_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Page Pipeline Layout"),
            bind_group_layouts: &[&page_layout, &camera_layout],
            push_constant_ranges: &[],
        });

        let attributes = vertex_attributes();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Page Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: PageVertex::STRIDE as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Each side of a sheet is its own draw; only the side facing
                // the camera survives
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        log::info!("🖥️  Mesh renderer ready ({:?})", adapter.get_info().backend);

        Ok(Self {
            device,
            queue,
            pipeline,
            page_layout,
            sampler,
            camera_bind_group,
            _camera_buffer: camera_buffer,
            max_dimension: limits.max_texture_dimension_2d,
            pages: Mutex::new(HashMap::new()),
        })
    }

    fn upload(&self, page: &PageTexture) -> GpuPage {
        let (width, height) = page.image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Page Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            page.image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Page Bind Group"),
            layout: &self.page_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        log::trace!("Uploaded page {} ({}x{})", page.key.page, width, height);

        GpuPage {
            epoch: page.epoch,
            _texture: texture,
            bind_group,
        }
    }

    /// Render the draws into a `width x height` RGBA image with a
    /// transparent background
    pub fn render(&self, draws: &[DrawCall], width: u32, height: u32) -> Result<RgbaImage> {
        let width = width.clamp(1, self.max_dimension);
        let height = height.clamp(1, self.max_dimension);

        let mut pages = self
            .pages
            .lock()
            .map_err(|_| BookError::Gpu("page texture table poisoned".to_string()))?;

        // Drop pages that left the screen or were re-rasterized
        pages.retain(|key, page| {
            draws
                .iter()
                .any(|d| d.texture.key == *key && d.texture.epoch == page.epoch)
        });
        for draw in draws {
            if !pages.contains_key(&draw.texture.key) {
                let page = self.upload(&draw.texture);
                pages.insert(draw.texture.key, page);
            }
        }

        let meshes: Vec<(wgpu::Buffer, wgpu::Buffer, u32, TextureKey)> = draws
            .iter()
            .map(|draw| {
                let vertices = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Page Vertices"),
                    contents: vertex_bytes(&draw.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let indices = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Page Indices"),
                    contents: index_bytes(&draw.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (vertices, indices, draw.indices.len() as u32, draw.texture.key)
            })
            .collect();

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let output_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Output"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let output_view = output_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(1, &self.camera_bind_group, &[]);

            for (vertices, indices, count, key) in &meshes {
                let Some(page) = pages.get(key) else {
                    continue;
                };
                render_pass.set_bind_group(0, &page.bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertices.slice(..));
                render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..*count, 0, 0..1);
            }
        }

        // Readback
        let padded_bytes_per_row = padded_row_bytes(width);
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Readback"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &output_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &output_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            size,
        );

        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| BookError::Gpu(format!("readback channel closed: {}", e)))?
            .map_err(|e| BookError::Gpu(format!("readback failed: {:?}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let mut output = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let start = (y * padded_bytes_per_row) as usize;
            let end = start + (width * 4) as usize;
            output.extend_from_slice(&data[start..end]);
        }

        drop(data);
        output_buffer.unmap();

        RgbaImage::from_raw(width, height, output)
            .ok_or_else(|| BookError::Gpu("readback size mismatch".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_match_vertex_layout() {
        let attributes = vertex_attributes();
        assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(attributes[1].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(attributes[2].format, wgpu::VertexFormat::Float32x2);

        let last = attributes[2];
        assert_eq!(
            last.offset + last.format.size(),
            PageVertex::STRIDE as wgpu::BufferAddress
        );
        let locations: Vec<u32> = attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn test_readback_rows_are_aligned() {
        assert_eq!(padded_row_bytes(64), 256);
        assert_eq!(padded_row_bytes(65), 512);
        assert_eq!(padded_row_bytes(1), 256);
    }
}
