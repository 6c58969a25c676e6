use std::time::Instant;

use tracing::{debug, info};

use crate::config::Config;
use crate::controller::camera_controller::CameraController;
use crate::controller::input::{InputEvent, InputProcessor, InputState};
use crate::model::timing::fps_title;
use crate::model::{Camera, FpsCounter, FrameClock, RenderParams};
use crate::view::uniforms::{names, UniformSink};

/// Lifecycle of the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
    Closed,
}

/// Presentation side effects the loop triggers: swap interval and window title
pub trait Presenter {
    fn apply_vsync(&mut self, enabled: bool);
    fn set_title(&mut self, title: &str);
}

/// Application state driven once per frame
pub struct FrameLoopContext {
    pub camera: Camera,
    pub params: RenderParams,
    pub input_state: InputState,
    pub input_processor: InputProcessor,
    pub camera_controller: CameraController,
    clock: FrameClock,
    fps: FpsCounter,
    vsync: bool,
    state: LoopState,
    pending: Vec<InputEvent>,
}

impl FrameLoopContext {
    pub fn new(config: &Config, now: Instant) -> Self {
        let cam = &config.camera;
        Self {
            camera: Camera::new(cam.eye, cam.yaw, cam.pitch),
            params: RenderParams::new(config),
            input_state: InputState::new(),
            input_processor: InputProcessor::default(),
            camera_controller: CameraController::new(&config.input),
            clock: FrameClock::new(now),
            fps: FpsCounter::new(now, config.fps_interval),
            vsync: config.vsync,
            state: LoopState::Running,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn request_close(&mut self) {
        if self.state == LoopState::Running {
            info!("close requested");
            self.state = LoopState::ShuttingDown;
        }
    }

    pub fn mark_closed(&mut self) {
        self.state = LoopState::Closed;
    }

    /// Queue an event for the next frame
    pub fn queue_event(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    /// Parameters that only change on resize or key input, pushed once at startup
    pub fn push_static_uniforms(&self, sink: &mut impl UniformSink) {
        let p = &self.params;
        sink.set_uniform(names::NEAR, p.near);
        sink.set_uniform(names::FAR, p.far);
        sink.set_uniform(names::WIDTH, p.width);
        sink.set_uniform(names::HEIGHT, p.height);
        sink.set_uniform(names::ASPECT_RATIO, p.aspect_ratio);
        sink.set_uniform(names::EPSILON, p.epsilon);
        sink.set_uniform(names::MAX_STEPS, p.max_steps);
    }

    /// Apply a new framebuffer size. Returns false for zero-area sizes,
    /// which are ignored.
    pub fn resize(&mut self, width: u32, height: u32, sink: &mut impl UniformSink) -> bool {
        if width == 0 || height == 0 {
            debug!(width, height, "ignoring zero-area resize");
            return false;
        }
        self.params.set_size(width, height);
        sink.set_uniform(names::WIDTH, self.params.width);
        sink.set_uniform(names::HEIGHT, self.params.height);
        sink.set_uniform(names::ASPECT_RATIO, self.params.aspect_ratio);
        true
    }

    pub fn handle_event(&mut self, event: InputEvent, presenter: &mut impl Presenter) {
        self.input_state.process_event(&event);
        match event {
            InputEvent::KeyDown(key) if self.input_processor.wants_to_toggle_vsync(key) => {
                self.vsync = !self.vsync;
                info!(vsync = self.vsync, "toggled vsync");
                presenter.apply_vsync(self.vsync);
            }
            InputEvent::PointerMoved { x, y } => {
                self.camera_controller.pointer_moved(&mut self.camera, x, y);
            }
            InputEvent::Scroll { dy } => {
                self.camera_controller.apply_scroll(&mut self.params, dy);
                debug!(speed = self.params.camera_speed, "camera speed");
            }
            _ => {}
        }
    }

    /// Start a frame: advance the clock, consume queued input and poll held
    /// keys. Returns the frame delta in seconds.
    pub fn begin_frame(
        &mut self,
        now: Instant,
        sink: &mut impl UniformSink,
        presenter: &mut impl Presenter,
    ) -> f32 {
        let dt = self.clock.tick(now);

        for event in std::mem::take(&mut self.pending) {
            self.handle_event(event, presenter);
        }

        if self.input_processor.wants_to_quit(&self.input_state) {
            self.request_close();
        }

        self.update(dt, sink);
        dt
    }

    /// Level-triggered key polling for one frame of length `dt`
    pub fn update(&mut self, dt: f32, sink: &mut impl UniformSink) {
        self.camera_controller.update_movement(
            &mut self.camera,
            &self.input_state,
            &self.input_processor,
            self.params.camera_speed,
            dt,
        );

        if let Some(delta) = self.input_processor.step_change(&self.input_state) {
            self.params.adjust_max_steps(delta);
            sink.set_uniform(names::MAX_STEPS, self.params.max_steps);
        }
    }

    pub fn push_frame_uniforms(&self, sink: &mut impl UniformSink) {
        let basis = self.camera.basis();
        sink.set_uniform(names::CAM_UP, basis.up);
        sink.set_uniform(names::CAM_RIGHT, basis.right);
        sink.set_uniform(names::CAM_FRONT, basis.front);
        sink.set_uniform(names::EYE, self.camera.eye);
        sink.set_uniform(names::FOCAL_LENGTH, self.params.focal_length);
    }

    /// Count the drawn frame and refresh the FPS title once per interval
    pub fn end_frame(&mut self, now: Instant, presenter: &mut impl Presenter) {
        if let Some(frames) = self.fps.record_frame(now) {
            presenter.set_title(&fps_title(frames));
        }
    }
}
