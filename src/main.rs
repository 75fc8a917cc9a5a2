use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use boids_grid::app_settings::AppSettings;
use boids_grid::physics::area::AreaEffect;
use boids_grid::physics::Flock;
use boids_grid::rendering::{BoidRenderer, Style};
use boids_grid::ui::{surface_to_simulation, Clock, FrameInput, Loop};
use log::{debug, info, warn};
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

/// Pixels of trackpad scroll that count as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 40.0;
const STATS_EVERY_STEPS: u64 = 600;

struct State<'window> {
    window: Arc<winit::window::Window>,
    surface: wgpu::Surface<'window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    clear_color: wgpu::Color,
    flock: Flock,
    area: AreaEffect,
    show_area: bool,
    renderer: BoidRenderer,
    clock: Clock,
    sim_loop: Loop,
    input: FrameInput,
    steps: u64,
    last_fps_update: Instant,
}

impl<'window> State<'window> {
    async fn new(
        window: Arc<winit::window::Window>,
        flock: Flock,
        show_area: bool,
        style: Style,
    ) -> Result<Self, Box<dyn Error>> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            dx12_shader_compiler: Default::default(),
            flags: wgpu::InstanceFlags::default(),
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("no compatible graphics adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
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
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let clear_color = wgpu::Color {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        };

        let settings = flock.settings().clone();
        let renderer = BoidRenderer::new(&device, surface_format, style);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            clear_color,
            area: AreaEffect::new(&settings),
            show_area,
            renderer,
            clock: Clock::new(settings.target_fps),
            sim_loop: Loop::new(),
            input: FrameInput::default(),
            steps: 0,
            last_fps_update: Instant::now(),
            flock,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                // Both in physical pixels; the plane is stretched over the surface.
                let surface = self.window.inner_size();
                self.input.pointer = surface_to_simulation(
                    position.x,
                    position.y,
                    surface.width,
                    surface.height,
                    self.flock.bounds(),
                );
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.input.pointer = None;
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_NOTCH) as f32,
                };
                true
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.input.clicked = true;
                true
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Space),
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.sim_loop.toggle_pause();
                info!("simulation {}", if self.sim_loop.pause { "paused" } else { "resumed" });
                true
            }
            _ => false,
        }
    }

    fn update(&mut self, now: Instant) {
        let dt = self.clock.tick(now) as f32;
        self.input.apply(&mut self.area);

        if !self.sim_loop.pause {
            let stats = self.flock.step(&self.area, dt);
            self.steps += 1;
            if self.steps % STATS_EVERY_STEPS == 0 {
                debug!(
                    "step {}: {} migrations, {} isolated, dt {:.2}ms",
                    self.steps,
                    stats.migrations,
                    stats.isolated,
                    self.clock.get_dt_millis()
                );
            }
        }

        // Update FPS display every 500ms
        let elapsed = now.duration_since(self.last_fps_update);
        if elapsed >= Duration::from_millis(500) {
            self.window.set_title(&format!(
                "Boids - {} agents - FPS: {:.1}{}",
                self.flock.len(),
                self.clock.get_avg_framerate(),
                if self.sim_loop.pause { " (paused)" } else { "" }
            ));
            self.last_fps_update = now;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let area = self.show_area.then_some(&self.area);
        self.renderer.prepare(
            &self.device,
            &self.queue,
            self.flock.boids(),
            area,
            self.flock.bounds(),
        );

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
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.renderer.render(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let app_settings = AppSettings::load().unwrap_or_else(|err| {
        warn!("{}, using default settings", err);
        AppSettings::default()
    });
    let settings = app_settings.simulation()?;
    info!(
        "profile `{}`: {} agents on {}x{}, view {} avoid {}",
        app_settings.profile,
        settings.agent_count,
        settings.width,
        settings.height,
        settings.view_distance,
        settings.avoid_distance
    );
    let flock = Flock::new(settings.clone())?;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Boids")
            .with_inner_size(winit::dpi::LogicalSize::new(settings.width, settings.height))
            .with_resizable(false)
            .build(&event_loop)?,
    );

    let style = if app_settings.radii_visible() {
        Style::with_radii(&settings)
    } else {
        Style::default()
    };
    let mut state = pollster::block_on(State::new(
        window.clone(),
        flock,
        app_settings.show_area,
        style,
    ))?;

    event_loop.run(move |event, target| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == state.window.id() => {
            if !state.input(event) {
                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => target.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let new_size = state.window.inner_size();
                        state.resize(new_size);
                    }
                    _ => {}
                }
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if state.clock.frame_due(now) {
                state.update(now);
                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => target.exit(),
                    Err(e) => warn!("{:?}", e),
                }
            }
            target.set_control_flow(ControlFlow::WaitUntil(state.clock.next_deadline()));
        }
        _ => {}
    })?;

    Ok(())
}
