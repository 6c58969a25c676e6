use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowId};

use volray::controller::input::native::{window_event_to_input, VirtualCursor};
use volray::controller::FrameLoopContext;
use volray::logging;
use volray::view::{draw_frame, GpuContext, RenderResources, ShaderProgram, UniformBlock, WindowPresenter};
use volray::Config;

/// Everything that exists once the window is up
struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    program: ShaderProgram,
    uniforms: UniformBlock,
    resources: RenderResources,
    frame: FrameLoopContext,
}

struct App {
    config: Config,
    graphics: Option<Graphics>,
    cursor: VirtualCursor,
    focused: bool,
    startup_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            graphics: None,
            cursor: VirtualCursor::default(),
            focused: true,
            startup_error: None,
        }
    }

    fn init_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics> {
        let cfg = &self.config;
        let attrs = Window::default_attributes()
            .with_title(cfg.window.title.as_str())
            .with_inner_size(PhysicalSize::new(cfg.window.width, cfg.window.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        grab_cursor(&window);

        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new_native(
            window.clone(),
            size.width,
            size.height,
            cfg.vsync,
        ))
        .context("GPU initialization failed")?;

        let program = ShaderProgram::build(
            &gpu.device,
            gpu.format,
            &cfg.shaders.vertex,
            &cfg.shaders.fragment,
        );
        if !program.is_linked() {
            warn!(
                errors = program.diagnostics().len(),
                "shader program unusable, only the clear colour will be drawn"
            );
        }

        let mut uniforms = UniformBlock::new(program.uniform_layout().clone());
        let resources = RenderResources::new(&gpu.device, &program, &uniforms);

        let mut frame = FrameLoopContext::new(cfg, Instant::now());
        frame.push_static_uniforms(&mut uniforms);
        frame.resize(size.width, size.height, &mut uniforms);

        Ok(Graphics {
            window,
            gpu,
            program,
            uniforms,
            resources,
            frame,
        })
    }
}

/// Hide the cursor and lock it to the window, confining it where locking is unsupported
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!(%err, "could not grab cursor");
    }
    window.set_cursor_visible(false);
}

impl Graphics {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if !self.frame.is_running() {
            event_loop.exit();
            return;
        }

        let mut presenter = WindowPresenter {
            gpu: &mut self.gpu,
            window: &self.window,
        };
        self.frame
            .begin_frame(Instant::now(), &mut self.uniforms, &mut presenter);
        if !self.frame.is_running() {
            event_loop.exit();
            return;
        }

        self.frame.push_frame_uniforms(&mut self.uniforms);
        self.resources
            .sync_uniforms(&self.gpu.queue, &mut self.uniforms);

        match draw_frame(&self.gpu, &self.program, &self.resources) {
            Ok(surface_texture) => {
                let mut presenter = WindowPresenter {
                    gpu: &mut self.gpu,
                    window: &self.window,
                };
                self.frame.end_frame(Instant::now(), &mut presenter);
                surface_texture.present();
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory, shutting down");
                self.frame.request_close();
                event_loop.exit();
            }
            Err(err) => warn!(%err, "dropped frame"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }

        match self.init_graphics(event_loop) {
            Ok(graphics) => {
                info!("window and GPU ready");
                self.graphics = Some(graphics);
            }
            Err(err) => {
                error!("{err:#}");
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };

        if let Some(input) = window_event_to_input(&event) {
            gfx.frame.queue_event(input);
        }

        match event {
            WindowEvent::CloseRequested => {
                gfx.frame.request_close();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if gfx.frame.resize(size.width, size.height, &mut gfx.uniforms) {
                    gfx.gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => gfx.redraw(event_loop),
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                if focused {
                    grab_cursor(&gfx.window);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if !self.focused {
            return;
        }
        if let (DeviceEvent::MouseMotion { delta }, Some(gfx)) = (event, self.graphics.as_mut()) {
            gfx.frame.queue_event(self.cursor.motion(delta.0, delta.1));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &self.graphics {
            if gfx.frame.is_running() {
                gfx.window.request_redraw();
            } else {
                event_loop.exit();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = self.graphics.as_mut() {
            gfx.frame.mark_closed();
        }
        // drop GPU resources before the window
        self.graphics = None;
        info!("closed");
    }
}

fn main() -> Result<()> {
    logging::init();
    info!("volray starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(Config::default());
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
