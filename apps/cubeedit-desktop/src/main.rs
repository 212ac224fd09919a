mod pointer;

use anyhow::{Context, Result};
use clap::Parser;
use cubeedit_author::{EditOutcome, Tool};
use cubeedit_common::Colour;
use cubeedit_input::PointerEvent;
use cubeedit_render_wgpu::{GpuPickTarget, WgpuRenderer};
use cubeedit_session::{EditorSession, SessionConfig};
use egui::Context as EguiContext;
use glam::Vec2;
use pointer::PointerTracker;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const INITIAL_SIZE: PhysicalSize<u32> = PhysicalSize::new(1280, 720);

#[derive(Parser)]
#[command(name = "cubeedit-desktop", about = "Voxel editor")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML session config
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state.
struct AppState {
    session: EditorSession,
    ground_extent: i32,
    pointer: PointerTracker,
    last_outcome: Option<EditOutcome>,
    started: Instant,
    last_frame: Instant,
}

impl AppState {
    fn new(config: &SessionConfig) -> Self {
        let now = Instant::now();
        Self {
            session: EditorSession::new(config, INITIAL_SIZE.width, INITIAL_SIZE.height),
            ground_extent: config.ground_extent,
            pointer: PointerTracker::default(),
            last_outcome: None,
            started: now,
            last_frame: now,
        }
    }

    /// Milliseconds since startup, the clock pointer events are stamped with.
    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        egui::TopBottomPanel::bottom("control_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let controls = self.session.controls_mut();
                let deleting = controls.selected() == Tool::Delete;
                if ui.selectable_label(deleting, "Delete").clicked() {
                    controls.select(Tool::Delete);
                }
                ui.separator();

                for slot in 0..controls.swatches().len() {
                    let selected = controls.selected() == Tool::Swatch(slot);
                    let mut rgb = controls
                        .swatch_colour(slot)
                        .unwrap_or(Colour::BLACK)
                        .to_bytes();
                    if ui.color_edit_button_srgb(&mut rgb).changed() {
                        let [r, g, b] = rgb;
                        controls.set_swatch(slot, Colour::from_bytes(r, g, b).to_hex());
                        controls.select(Tool::Swatch(slot));
                    }
                    let label = controls.swatches()[slot].clone();
                    if ui.selectable_label(selected, label).clicked() {
                        controls.select(Tool::Swatch(slot));
                    }
                }
            });

            ui.separator();
            ui.horizontal(|ui| {
                let pose = self.session.camera().pose();
                ui.label(format!("Cubes: {}", self.session.world().len()));
                ui.label(format!(
                    "Camera: rot {:.1} pan {:.1} dist {:.2} asc {:.2}",
                    pose.rotation, pose.pan, pose.distance, pose.ascension
                ));
                if let Some(outcome) = &self.last_outcome {
                    ui.label(format!("Last: {outcome:?}"));
                }
            });
            ui.small("LMB drag: rotate/pan | RMB drag: raise/zoom | Click: add or delete");
        });
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    /// Set when GPU setup fails; reported after the event loop exits.
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: &SessionConfig) -> Self {
        Self {
            state: AppState::new(config),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            fatal: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Cube Editor")
            .with_inner_size(INITIAL_SIZE);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("creating window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubeedit_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.session.resize(config.width, config.height);
        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            self.state.ground_extent,
        )?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    /// Feed one pointer event through the session with the GPU as pick surface.
    fn dispatch_pointer(&mut self, event: PointerEvent) {
        let (Some(renderer), Some(device), Some(queue)) =
            (&mut self.renderer, &self.device, &self.queue)
        else {
            return;
        };
        let mut target = GpuPickTarget {
            renderer,
            device,
            queue,
        };
        let outcomes = self.state.session.handle_pointer(&event, &mut target);
        if let Some(last) = outcomes.last() {
            self.state.last_outcome = Some(*last);
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let (Some(surface), Some(device), Some(config)) =
            (&self.surface, &self.device, &mut self.config)
        else {
            return;
        };
        config.width = new_size.width.max(1);
        config.height = new_size.height.max(1);
        surface.configure(device, config);
        self.state.session.resize(config.width, config.height);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(device, config.width, config.height);
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let frame_ms = (now - self.state.last_frame).as_secs_f64() * 1000.0;
        self.state.last_frame = now;
        self.state.session.tick(frame_ms);

        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(config),
            Some(renderer),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.config,
            &mut self.renderer,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        )
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        {
            let mut target = GpuPickTarget {
                renderer: &mut *renderer,
                device,
                queue,
            };
            self.state.session.sync(&mut target);
        }
        renderer.render(device, queue, &view, &self.state.session.render_view());

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_gpu(event_loop) {
            tracing::error!("GPU setup failed: {err:#}");
            self.fatal = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            // Releases always reach the session so a drag that ends over the
            // control bar still ends.
            let release = matches!(
                event,
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    ..
                }
            );
            if response.consumed && !release {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize(new_size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let now = self.state.now_ms();
                let event = self
                    .state
                    .pointer
                    .cursor_moved(Vec2::new(position.x as f32, position.y as f32), now);
                self.dispatch_pointer(event);
            }
            WindowEvent::CursorLeft { .. } => {
                let now = self.state.now_ms();
                let event = self.state.pointer.left(now);
                self.dispatch_pointer(event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let now = self.state.now_ms();
                let pressed = state == ElementState::Pressed;
                if let Some(event) = self.state.pointer.button(button, pressed, now) {
                    self.dispatch_pointer(event);
                }
            }
            WindowEvent::Touch(touch) => {
                let now = self.state.now_ms();
                let location = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                let input = self
                    .state
                    .pointer
                    .touch(touch.id, touch.phase, location, now);
                self.dispatch_pointer(input.to_pointer());
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    tracing::info!("cubeedit-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(&config);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
