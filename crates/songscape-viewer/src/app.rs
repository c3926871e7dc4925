use crate::{
    assets::AssetWorker,
    config::Config,
    data::types::PointUniforms,
    net::QueryWorker,
    renderer::Renderer,
    ui::{self, HudAction, HudState, HudStats},
};
use anyhow::Result;
use glam::DVec2;
use songscape::texture_cache::{CacheLookup, TextureCache};
use songscape::{DensityTier, MapSession, PointBuffer, PointerInput, Viewport};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    window::Window,
};

/// Pixels per wheel "line", matching what browsers report as `deltaY`.
pub const LINE_DELTA_PX: f64 = 100.0;

/// Converts a winit wheel delta to the DOM convention (positive = zoom out).
pub fn wheel_delta_y(delta: MouseScrollDelta) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -(y as f64) * LINE_DELTA_PX,
        MouseScrollDelta::PixelDelta(pos) => -pos.y,
    }
}

fn logical_viewport(size: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let logical = size.to_logical::<f64>(scale_factor);
    Viewport::new(logical.width, logical.height)
}

pub struct App {
    pub renderer: Renderer,
    pub session: MapSession,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    queries: QueryWorker,
    assets: AssetWorker,
    textures: TextureCache<image::RgbaImage>,
    hud: HudState,
    tier: DensityTier,
    scale_factor: f64,
    /// Last cursor position in logical pixels.
    cursor: Option<DVec2>,
    last_frame: Instant,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config, points: PointBuffer) -> Result<Self> {
        let renderer = Renderer::new(window.clone(), &points).await?;
        let scale_factor = window.scale_factor();
        let viewport = logical_viewport(renderer.gfx.size, scale_factor);

        let session = MapSession::new(config.session(), viewport);
        let queries = QueryWorker::spawn(config.api_base().to_owned())?;
        let assets = AssetWorker::spawn()?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            session,
            egui_ctx,
            egui_state,
            queries,
            assets,
            textures: TextureCache::new(),
            hud: HudState::default(),
            tier: points.tier(),
            scale_factor,
            cursor: None,
            last_frame: Instant::now(),
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.session
                .set_viewport(logical_viewport(new_size, self.scale_factor));
        }
    }

    /// Returns `true` if the event was consumed.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let p = position.to_logical::<f64>(self.scale_factor);
                let p = DVec2::new(p.x, p.y);
                self.cursor = Some(p);
                self.session.handle_input(PointerInput::Moved { position: p });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let position = self.cursor.unwrap_or(DVec2::ZERO);
                let input = match state {
                    ElementState::Pressed => PointerInput::Pressed { position },
                    ElementState::Released => PointerInput::Released { position },
                };
                self.session.handle_input(input);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.session.handle_input(PointerInput::Wheel {
                    delta_y: wheel_delta_y(*delta),
                });
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.session.handle_input(PointerInput::Left);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = *scale_factor;
                self.resize(window.inner_size());
            }
            WindowEvent::Resized(physical_size) => {
                self.resize(*physical_size);
            }
            _ => {}
        }

        false
    }

    /// Stops queries and asset loads. The session ignores input afterwards.
    pub fn shutdown(&mut self) {
        self.session.teardown();
        self.queries.shutdown();
        self.assets.shutdown();
    }

    /// Advances the session by one frame and exchanges work with the workers.
    fn step(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;

        for response in self.queries.try_iter() {
            self.session.accept_query(response);
        }
        if let Some(request) = self.session.frame(now, dt) {
            self.queries.submit(request);
        }
        for event in self.session.drain_events() {
            self.hud.apply(event);
        }

        self.update_hover_texture(now);
    }

    /// Binds the hovered song's cover, loading it through the cache. The
    /// previous texture stays bound until the new one is decoded.
    fn update_hover_texture(&mut self, now: Instant) {
        let wanted = self
            .session
            .hovered_candidate()
            .and_then(|c| c.cover_url())
            .map(str::to_owned);

        for decoded in self.assets.try_iter() {
            match decoded.result {
                Ok(image) => {
                    let bind = self
                        .textures
                        .complete(&decoded.reference, image, wanted.as_deref());
                    if bind {
                        if let Some(image) = self.textures.get(&decoded.reference) {
                            self.renderer.upload_hover(image);
                        }
                        self.textures.set_active(&decoded.reference);
                    }
                }
                Err(err) => {
                    log::warn!("Cover {} failed: {}", decoded.reference, err);
                    self.textures.fail(&decoded.reference, now);
                }
            }
        }

        let Some(wanted) = wanted else {
            return;
        };
        if self.textures.active() == Some(wanted.as_str()) {
            return;
        }
        match self.textures.request(&wanted, now) {
            CacheLookup::Hit(image) => {
                self.renderer.upload_hover(image);
                self.textures.set_active(&wanted);
            }
            CacheLookup::Miss => self.assets.request(wanted),
            CacheLookup::Pending | CacheLookup::Failed => {}
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.step(Instant::now());

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = PointUniforms::new(
            self.session.camera().snapshot(),
            [self.renderer.gfx.config.width, self.renderer.gfx.config.height],
            self.scale_factor as f32,
            self.session.hover_position(),
        );
        self.renderer.render(&swap_view, &uniforms);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        let stats = HudStats {
            tier: self.tier,
            points: self.renderer.cloud.instances_len,
            candidates: self.session.candidates().len(),
            hover_anchor: self
                .session
                .hover()
                .map(|h| egui::pos2(h.screen.x as f32, h.screen.y as f32)),
        };
        if ui::draw_hud(&self.egui_ctx, &self.hud, &stats) == HudAction::CloseSelection {
            self.session.clear_selection();
            for event in self.session.drain_events() {
                self.hud.apply(event);
            }
        }

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
