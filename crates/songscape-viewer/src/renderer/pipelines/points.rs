// Draws every song as a screen-space dot: one instanced quad per point.

use crate::data::types::PointUniforms;
use crate::renderer::hover_texture::HoverTexture;
use songscape::points::{PointBuffer, PointRecord};
use wgpu::util::DeviceExt;

/// Static per-tier point storage, uploaded once.
pub struct PointCloudGpu {
    vtx: Option<wgpu::Buffer>,
    pub instances_len: u32,
}

impl PointCloudGpu {
    pub fn upload(device: &wgpu::Device, points: &PointBuffer) -> Self {
        if points.is_empty() {
            return Self {
                vtx: None,
                instances_len: 0,
            };
        }
        let vtx = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Instance VB"),
            contents: points.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vtx: Some(vtx),
            instances_len: points.len() as u32,
        }
    }
}

pub struct PointsPipeline {
    pipeline:       wgpu::RenderPipeline,
    bind_group:     wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    quad_vb:        wgpu::Buffer,
}

impl PointsPipeline {
    pub fn new(
        device:       &wgpu::Device,
        color_fmt:    wgpu::TextureFormat,
        hover_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Point Uniform Buffer"),
            size:               std::mem::size_of::<PointUniforms>() as u64,
            usage:              wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label:   Some("Point Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding:    0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty:                 wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size:   wgpu::BufferSize::new(
                        std::mem::size_of::<PointUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label:   Some("Point Uniform Bind Group"),
            layout:  &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding:  0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label:  Some("points.wgsl"),
            source: wgpu::ShaderSource::Wgsl(POINTS_WGSL.into()),
        });

        // Unit quad; the vertex stage scales it to the dot size in pixels.
        let corners: [[f32; 2]; 6] = [
            [-1.0, -1.0], [1.0, -1.0], [1.0, 1.0],
            [-1.0, -1.0], [1.0, 1.0],  [-1.0, 1.0],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label:    Some("Point Quad VB"),
            contents: bytemuck::cast_slice(&corners),
            usage:    wgpu::BufferUsages::VERTEX,
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode:    wgpu::VertexStepMode::Vertex,
                attributes:   &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset:          0,
                    format:          wgpu::VertexFormat::Float32x2,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointRecord>() as u64,
                step_mode:    wgpu::VertexStepMode::Instance,
                attributes:   &[
                    // World position
                    wgpu::VertexAttribute {
                        shader_location: 1,
                        offset:          0,
                        format:          wgpu::VertexFormat::Float32x2,
                    },
                    // Feature
                    wgpu::VertexAttribute {
                        shader_location: 2,
                        offset:          8,
                        format:          wgpu::VertexFormat::Float32,
                    },
                ],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label:                Some("Points PipelineLayout"),
            bind_group_layouts:   &[&uniform_layout, hover_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label:  Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module:              &shader,
                entry_point:         "vs_main",
                buffers:             &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            fragment: Some(wgpu::FragmentState {
                module:      &shader,
                entry_point: "fs_main",
                targets:     &[Some(wgpu::ColorTargetState {
                    format:     color_fmt,
                    blend:      Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview:   None,
        });

        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            quad_vb,
        }
    }

    pub fn draw<'a>(
        &'a self,
        rpass:    &mut wgpu::RenderPass<'a>,
        queue:    &wgpu::Queue,
        cloud:    &'a PointCloudGpu,
        hover:    &'a HoverTexture,
        uniforms: &PointUniforms,
    ) {
        let Some(vtx) = cloud.vtx.as_ref() else {
            return;
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_bind_group(1, &hover.bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, vtx.slice(..));
        rpass.draw(0..6, 0..cloud.instances_len);
    }
}

pub const POINTS_WGSL: &str = r#"
// Must equal BASE_SCALE on the CPU side, or hit-testing drifts from what is drawn.
const BASE_SCALE: f32 = 10.0;

struct Uniforms {
    offset: vec2<f32>,
    viewport: vec2<f32>,
    hover_pos: vec2<f32>,
    scale: f32,
    aspect: f32,
    point_size: f32,
    hover_growth: f32,
    hover_epsilon: f32,
    _pad: f32,
};
@group(0) @binding(0) var<uniform> U: Uniforms;

@group(1) @binding(0) var hover_tex: texture_2d<f32>;
@group(1) @binding(1) var hover_samp: sampler;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) color: vec3<f32>,
    @location(2) hovered: f32,
}

fn hue_to_rgb(p: f32, q: f32, t_in: f32) -> f32 {
    var t = t_in;
    if (t < 0.0) { t += 1.0; }
    if (t > 1.0) { t -= 1.0; }
    if (t < 1.0 / 6.0) { return p + (q - p) * 6.0 * t; }
    if (t < 1.0 / 2.0) { return q; }
    if (t < 2.0 / 3.0) { return p + (q - p) * (2.0 / 3.0 - t) * 6.0; }
    return p;
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> vec3<f32> {
    let q = select(l + s - l * s, l * (1.0 + s), l < 0.5);
    let p = 2.0 * l - q;
    return vec3<f32>(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    );
}

@vertex
fn vs_main(
    @location(0) corner: vec2<f32>,
    @location(1) pos: vec2<f32>,
    @location(2) feature: f32,
) -> VSOut {
    // 1.0 when this is the hovered point, 0.0 otherwise.
    let hovered = step(distance(pos, U.hover_pos), U.hover_epsilon);

    var center = (pos + U.offset) * (U.scale * BASE_SCALE);
    center.x = center.x / U.aspect;

    let size = U.point_size * mix(1.0, U.hover_growth, hovered);

    var out: VSOut;
    out.clip = vec4<f32>(center + corner * size / U.viewport, 0.0, 1.0);
    out.corner = corner;
    out.color = hsl_to_rgb(clamp(feature, 0.0, 1.0), 1.0, 0.5);
    out.hovered = hovered;
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    let uv = in.corner * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    let tex = textureSampleLevel(hover_tex, hover_samp, uv, 0.0);

    // Round dots
    if (dot(in.corner, in.corner) > 1.0) {
        discard;
    }

    // The placeholder is transparent, so the dot keeps its color until a cover arrives.
    let textured = mix(in.color, tex.rgb, tex.a);
    return vec4<f32>(mix(in.color, textured, in.hovered), 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use songscape::config::BASE_SCALE;

    #[test]
    fn shader_scale_matches_hit_testing() {
        let decl = format!("const BASE_SCALE: f32 = {:.1};", BASE_SCALE);
        assert!(POINTS_WGSL.contains(&decl), "missing `{decl}`");
    }

    #[test]
    fn instance_stride_matches_payload() {
        assert_eq!(
            std::mem::size_of::<PointRecord>(),
            songscape::points::POINT_STRIDE_BYTES
        );
    }
}
