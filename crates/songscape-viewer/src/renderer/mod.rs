//! Owns the GPU context, the point pipeline, the hover texture and the egui
//! renderer.

pub mod context;
pub mod hover_texture;
pub mod pipelines;

use self::{
    context::GfxContext,
    hover_texture::HoverTexture,
    pipelines::points::{PointCloudGpu, PointsPipeline},
};
use crate::data::types::PointUniforms;
use crate::error::ViewerError;
use songscape::PointBuffer;
use std::sync::Arc;
use winit::window::Window;

const BACKGROUND: wgpu::Color = wgpu::Color { r: 0.02, g: 0.02, b: 0.03, a: 1.0 };

pub struct Renderer {
    pub gfx: GfxContext,
    pub points: PointsPipeline,
    pub cloud: PointCloudGpu,
    pub hover: HoverTexture,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    /// Creates all GPU state and uploads the point cloud once.
    pub async fn new(window: Arc<Window>, points: &PointBuffer) -> Result<Self, ViewerError> {
        let gfx = GfxContext::new(window).await?;

        let hover = HoverTexture::new(&gfx.device, &gfx.queue);
        let pipeline = PointsPipeline::new(&gfx.device, gfx.config.format, &hover.layout);
        let cloud = PointCloudGpu::upload(&gfx.device, points);
        log::info!(
            "Uploaded {} points ({} tier)",
            cloud.instances_len,
            points.tier()
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            points: pipeline,
            cloud,
            hover,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gfx.resize(new_size);
    }

    pub fn upload_hover(&mut self, image: &image::RgbaImage) {
        self.hover.upload(&self.gfx.device, &self.gfx.queue, image);
    }

    pub fn render(&mut self, swap_view: &wgpu::TextureView, uniforms: &PointUniforms) {
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Points Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.points
                .draw(&mut pass, &self.gfx.queue, &self.cloud, &self.hover, uniforms);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
