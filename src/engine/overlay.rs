use egui::epaint::Shadow;

use super::systems::AgentDraw;
use super::view::DomainView;

pub struct FrameStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    /// Time spent in the last schedule run (ms).
    pub tick_ms: f32,
    pub agent_count: usize,
    pub ticks: u64,
    pub paused: bool,
    pub resolution: (u32, u32),
    pub view_filter: bool,
    pub collision_avoidance: bool,
}

/// Geometry shared by every agent drawn in a frame.
pub struct AgentStyle {
    /// Body diameter in domain units.
    pub size: f64,
    /// Half-angle of the view cone in degrees.
    pub view_angle: f64,
    pub show_view_cones: bool,
}

const BODY_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 220, 220);
const HEADING_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 200, 255);
const CONE_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(90, 80, 0, 110);

/// Paint agents as a body circle with a heading line. View-cone whiskers
/// are added when `style.show_view_cones` is set.
pub fn paint_agents(painter: &egui::Painter, view: &DomainView, agents: &[AgentDraw], style: &AgentStyle) {
    let radius_px = (style.size * 0.5) as f32 * view.scale();
    let body = egui::Stroke::new(1.0, BODY_COLOR);
    let heading = egui::Stroke::new(1.0, HEADING_COLOR);
    let cone = egui::Stroke::new(1.0, CONE_COLOR);

    for agent in agents {
        let centre = view.to_screen(agent.position);
        painter.circle_stroke(centre, radius_px, body);
        painter.line_segment(
            [centre, view.ray_end(agent.position, agent.heading, style.size * 2.0)],
            heading,
        );

        if style.show_view_cones {
            let len = style.size * 1.3;
            for side in [style.view_angle, -style.view_angle] {
                let tip = view.ray_end(agent.position, agent.heading + side, len);
                painter.line_segment([centre, tip], cone);
            }
        }
    }
}

pub struct Overlay {
    pub stats_visible: bool,
    pub view_cones_visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Overlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        egui_ctx.set_visuals(panel_visuals());
        egui_ctx.style_mut(|style| {
            style.override_font_id = Some(egui::FontId::monospace(13.0));
        });

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        // Drawn straight onto the swapchain image: no depth, single sample.
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            stats_visible: false,
            view_cones_visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle_stats(&mut self) {
        self.stats_visible = !self.stats_visible;
    }

    pub fn toggle_view_cones(&mut self) {
        self.view_cones_visible = !self.view_cones_visible;
    }

    /// Forward a window event to egui. The flock redraws on the pacer's
    /// schedule, so egui's repaint requests are not needed.
    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) {
        let _repaint = self.egui_state.on_window_event(window, event).repaint;
    }

    /// Render one egui frame: the flock on a background layer, the domain
    /// border, and the stats panel when `stats` is given.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        target: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        view: &DomainView,
        agents: &[AgentDraw],
        style: &AgentStyle,
        stats: Option<&FrameStats>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Background,
                egui::Id::new("flock"),
            ));
            painter.rect_stroke(
                view.domain_rect(),
                0.0,
                egui::Stroke::new(1.0, egui::Color32::from_gray(60)),
            );
            paint_agents(&painter, view, agents, style);

            if let Some(stats) = stats {
                egui::Area::new(egui::Id::new("stats_panel"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!(
                                    "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                    stats.frame_time_avg_ms,
                                    stats.frame_time_min_ms,
                                    stats.frame_time_max_ms
                                ));
                                ui.label(format!("Tick: {:.2} ms", stats.tick_ms));
                                ui.label(format!(
                                    "Agents: {}  Ticks: {}{}",
                                    stats.agent_count,
                                    stats.ticks,
                                    if stats.paused { "  [paused]" } else { "" }
                                ));
                                ui.label(format!(
                                    "Resolution: {} x {}",
                                    stats.resolution.0, stats.resolution.1
                                ));
                                ui.label(format!(
                                    "View filter: {}  Avoidance: {}",
                                    on_off(stats.view_filter),
                                    on_off(stats.collision_avoidance)
                                ));
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// Dark translucent panels with white text over the flock.
fn panel_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();
    visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
    visuals.window_stroke = egui::Stroke::NONE;
    visuals.window_shadow = Shadow::NONE;
    visuals.override_text_color = Some(egui::Color32::WHITE);
    visuals
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
