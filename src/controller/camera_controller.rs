use glam::Vec3;

use crate::config::InputTuning;
use crate::controller::input::{InputProcessor, InputState};
use crate::model::{Camera, CameraBasis, RenderParams};

/// Handles camera movement and orientation
#[derive(Debug, Clone)]
pub struct CameraController {
    pub mouse_sensitivity: f32,
    pub scroll_speed_step: f32,
    /// Last pointer sample; `None` until the first one arrives
    last_pointer: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new(tuning: &InputTuning) -> Self {
        Self {
            mouse_sensitivity: tuning.mouse_sensitivity,
            scroll_speed_step: tuning.scroll_speed_step,
            last_pointer: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.last_pointer.is_some()
    }

    /// Turn the camera by the pointer offset since the last sample. The first
    /// sample only records a baseline, so the camera does not jump.
    pub fn pointer_moved(&mut self, camera: &mut Camera, x: f64, y: f64) {
        let Some((last_x, last_y)) = self.last_pointer.replace((x, y)) else {
            return;
        };

        let dx = (x - last_x) as f32 * self.mouse_sensitivity;
        // screen y grows downwards
        let dy = (last_y - y) as f32 * self.mouse_sensitivity;

        camera.look(-dx, dy);
    }

    pub fn apply_scroll(&self, params: &mut RenderParams, dy: f64) {
        params.adjust_camera_speed(dy as f32 * self.scroll_speed_step);
    }

    /// Move the eye for every held movement key, scaled by speed and frame time.
    /// Up/down move along world Y, not the camera's up vector.
    pub fn update_movement(
        &self,
        camera: &mut Camera,
        input: &InputState,
        processor: &InputProcessor,
        speed: f32,
        dt: f32,
    ) {
        let step = speed * dt;
        let CameraBasis { front, right, .. } = camera.basis();

        if processor.is_moving_forward(input) {
            camera.eye += front * step;
        }
        if processor.is_moving_backward(input) {
            camera.eye -= front * step;
        }
        if processor.is_moving_left(input) {
            camera.eye -= right * step;
        }
        if processor.is_moving_right(input) {
            camera.eye += right * step;
        }
        if processor.is_moving_up(input) {
            camera.eye += Vec3::Y * step;
        }
        if processor.is_moving_down(input) {
            camera.eye -= Vec3::Y * step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::controller::input::{InputEvent, Key};
    use crate::model::camera::PITCH_LIMIT;

    fn controller() -> CameraController {
        CameraController::new(&Config::default().input)
    }

    #[test]
    fn first_pointer_sample_is_only_a_baseline() {
        let mut ctl = controller();
        let mut cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        assert!(!ctl.is_tracking());

        ctl.pointer_moved(&mut cam, 500.0, 300.0);
        assert!(ctl.is_tracking());
        assert_eq!(cam.yaw, 0.0);
        assert_eq!(cam.pitch(), 0.0);
    }

    #[test]
    fn pointer_offsets_turn_the_camera() {
        let mut ctl = controller();
        let mut cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        ctl.pointer_moved(&mut cam, 0.0, 0.0);

        // right and up on screen
        ctl.pointer_moved(&mut cam, 10.0, -20.0);
        assert!((cam.yaw - -0.05).abs() < 1e-6);
        assert!((cam.pitch() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn pitch_stays_clamped_for_any_pointer_sequence() {
        let mut ctl = controller();
        let mut cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        let (mut x, mut y) = (0.0f64, 0.0f64);
        let mut seed: u32 = 0x1234_5678;
        for _ in 0..2000 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let dx = f64::from(seed >> 16) - 32768.0;
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let dy = f64::from(seed >> 16) - 32768.0;
            x += dx;
            y += dy;
            ctl.pointer_moved(&mut cam, x, y);
            assert!(cam.pitch() <= PITCH_LIMIT && cam.pitch() >= -PITCH_LIMIT);
        }
    }

    #[test]
    fn scroll_changes_speed() {
        let ctl = controller();
        let mut params = RenderParams::new(&Config::default());
        ctl.apply_scroll(&mut params, 5.0);
        assert!((params.camera_speed - 0.6).abs() < 1e-6);
        ctl.apply_scroll(&mut params, -1.0);
        assert!((params.camera_speed - 0.58).abs() < 1e-6);
    }

    #[test]
    fn vertical_movement_ignores_pitch() {
        let ctl = controller();
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(Key::Space));

        let mut cam = Camera::new(Vec3::ZERO, 0.3, 0.8);
        ctl.update_movement(&mut cam, &input, &processor, 2.0, 0.5);
        assert!(cam.eye.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn forward_follows_the_view_direction() {
        let ctl = controller();
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(Key::W));

        let mut cam = Camera::new(Vec3::ZERO, 0.5, 0.3);
        let front = cam.basis().front;
        ctl.update_movement(&mut cam, &input, &processor, 2.0, 0.25);
        assert!(cam.eye.abs_diff_eq(front * 0.5, 1e-6));
    }

    #[test]
    fn strafe_moves_along_right() {
        let ctl = controller();
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(Key::D));

        let mut cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        ctl.update_movement(&mut cam, &input, &processor, 1.0, 1.0);
        assert!(cam.eye.abs_diff_eq(Vec3::X, 1e-6));

        input.process_event(&InputEvent::KeyUp(Key::D));
        input.process_event(&InputEvent::KeyDown(Key::A));
        ctl.update_movement(&mut cam, &input, &processor, 1.0, 1.0);
        assert!(cam.eye.abs_diff_eq(Vec3::ZERO, 1e-6));
    }
}
