// 2D boids flock: each agent steers toward its nearest neighbour, or aligns
// with the local group once close enough. The flock lives in an ECS world
// and is drawn through egui on top of a cleared wgpu surface.

mod engine;

use std::sync::Arc;
use std::time::Instant;

use bevy_ecs::prelude::*;
use glam::Vec2;
use winit::{
    event::{Event as WinitEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::Window,
};

use engine::input::{Action, InputState};
use engine::overlay::{AgentStyle, FrameStats, Overlay};
use engine::pacing::{FramePacer, FrameTimer, FrameTimes};
use engine::systems::{self, FrameDraws, SimControl};
use engine::view::DomainView;
use engine::{AppError, Flock, FlockConfig};

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.04,
    a: 1.0,
};

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    overlay: Overlay,
    view: DomainView,

    // ECS World
    world: World,
    schedule: Schedule,
    last_tick_ms: f32,
}

impl State {
    async fn new(window: Arc<Window>, flock: Flock) -> engine::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(AppError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let overlay = Overlay::new(&window, &device, surface_format);

        let flock_config = flock.config();
        let mut view = DomainView::new(flock_config.width, flock_config.height);
        view.fit(logical_size(&window, size));

        let world = systems::build_world(flock);
        let schedule = systems::build_schedule();

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            overlay,
            view,
            world,
            schedule,
            last_tick_ms: 0.0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.view.fit(logical_size(&self.window, new_size));
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::ToggleStats => self.overlay.toggle_stats(),
            Action::ToggleViewCones => self.overlay.toggle_view_cones(),
            Action::TogglePause => {
                let mut control = self.world.resource_mut::<SimControl>();
                control.paused = !control.paused;
                log::debug!("paused: {}", control.paused);
            }
            Action::Reset => self.world.resource_mut::<SimControl>().reset_requested = true,
            // Handled by the event loop.
            Action::Quit => {}
        }
    }

    /// Run the schedule once: reset if requested, then tick the flock.
    fn update(&mut self) {
        let start = Instant::now();
        self.schedule.run(&mut self.world);
        self.last_tick_ms = start.elapsed().as_secs_f32() * 1000.0;
    }

    fn stats(&self, times: FrameTimes) -> FrameStats {
        let flock = self.world.resource::<Flock>();
        let control = self.world.resource::<SimControl>();
        FrameStats {
            fps: times.fps,
            frame_time_avg_ms: times.avg_ms,
            frame_time_min_ms: times.min_ms,
            frame_time_max_ms: times.max_ms,
            tick_ms: self.last_tick_ms,
            agent_count: flock.len(),
            ticks: control.ticks,
            paused: control.paused,
            resolution: (self.size.width, self.size.height),
            view_filter: flock.config().enable_view_filter,
            collision_avoidance: flock.config().enable_collision_avoidance,
        }
    }

    fn render(&mut self, stats: Option<&FrameStats>) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        let flock_config = self.world.resource::<Flock>().config();
        let style = AgentStyle {
            size: flock_config.agent_size,
            view_angle: flock_config.view_angle,
            show_view_cones: self.overlay.view_cones_visible,
        };
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let draws = &self.world.resource::<FrameDraws>().agents;

        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &target,
            &screen_descriptor,
            &self.view,
            draws,
            &style,
            stats,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn logical_size(window: &Window, size: winit::dpi::PhysicalSize<u32>) -> Vec2 {
    let logical = size.to_logical::<f32>(window.scale_factor());
    Vec2::new(logical.width, logical.height)
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> Result<(), AppError> {
    env_logger::init();

    let config = FlockConfig::default();
    let flock = Flock::new(config.clone(), &mut rand::thread_rng())?;
    log::info!(
        "{} agents in {} x {} (view filter: {}, collision avoidance: {}, averaging: {:?})",
        flock.len(),
        config.width,
        config.height,
        config.enable_view_filter,
        config.enable_collision_avoidance,
        config.heading_average,
    );

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("Boids Simulation")
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window, flock))?;
    let mut pacer = FramePacer::new(config.frame_delay);
    let mut timer = FrameTimer::new(Instant::now());
    let mut input = InputState::new();

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == state.window.id() => {
                input.process_event(event);
                state.overlay.handle_window_event(&state.window, event);

                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        pacer.begin_frame(now);

                        for action in input.actions().collect::<Vec<_>>() {
                            match action {
                                Action::Quit => control_flow.exit(),
                                other => state.apply(other),
                            }
                        }
                        input.end_frame();

                        state.update();

                        if let Some(times) = timer.record(now) {
                            log::debug!(
                                "FPS: {} | frame {:.2} ms | tick {:.2} ms",
                                times.fps,
                                times.avg_ms,
                                state.last_tick_ms
                            );
                        }
                        let stats = state
                            .overlay
                            .stats_visible
                            .then(|| state.stats(timer.latest()));

                        match state.render(stats.as_ref()) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("surface error: {e:?}"),
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                if pacer.is_due(Instant::now()) {
                    state.window.request_redraw();
                } else if let Some(deadline) = pacer.next_deadline() {
                    control_flow.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
