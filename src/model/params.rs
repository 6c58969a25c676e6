use crate::config::{Config, ParamLimits};

/// Scalar parameters shared with the ray-marching shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub near: f32,
    pub far: f32,
    pub width: i32,
    pub height: i32,
    pub aspect_ratio: f32,
    pub epsilon: f32,
    pub max_steps: i32,
    pub focal_length: f32,
    pub camera_speed: f32,
    limits: ParamLimits,
}

impl RenderParams {
    pub fn new(config: &Config) -> Self {
        let width = config.window.width as i32;
        let height = config.window.height as i32;
        let render = &config.render;
        Self {
            near: render.near,
            far: render.far,
            width,
            height,
            aspect_ratio: width as f32 / height as f32,
            epsilon: render.epsilon,
            max_steps: render.max_steps.max(config.limits.min_max_steps),
            focal_length: render.focal_length,
            camera_speed: render.camera_speed.max(config.limits.min_camera_speed),
            limits: config.limits,
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width as i32;
        self.height = height as i32;
        self.aspect_ratio = width as f32 / height as f32;
    }

    /// Change the ray-march iteration cap, never below the configured minimum
    pub fn adjust_max_steps(&mut self, delta: i32) {
        self.max_steps = self
            .max_steps
            .saturating_add(delta)
            .max(self.limits.min_max_steps);
    }

    pub fn adjust_camera_speed(&mut self, delta: f32) {
        self.camera_speed = (self.camera_speed + delta).max(self.limits.min_camera_speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config() {
        let params = RenderParams::new(&Config::default());
        assert_eq!(params.width, 800);
        assert_eq!(params.height, 600);
        assert_eq!(params.aspect_ratio, 800.0 / 600.0);
        assert_eq!(params.max_steps, 64);
        assert_eq!(params.camera_speed, 0.5);
    }

    #[test]
    fn params_compare_by_value() {
        let config = Config::default();
        let mut params = RenderParams::new(&config);
        assert_eq!(params, RenderParams::new(&config));

        params.adjust_max_steps(1);
        assert_ne!(params, RenderParams::new(&config));
    }

    #[test]
    fn resize_recomputes_aspect() {
        let mut params = RenderParams::new(&Config::default());
        params.set_size(1920, 1080);
        assert_eq!(params.width, 1920);
        assert_eq!(params.height, 1080);
        assert_eq!(params.aspect_ratio, 1920.0 / 1080.0);
    }

    #[test]
    fn step_cap_has_a_floor() {
        let mut params = RenderParams::new(&Config::default());
        params.adjust_max_steps(-1000);
        assert_eq!(params.max_steps, 1);
        params.adjust_max_steps(5);
        assert_eq!(params.max_steps, 6);
        params.max_steps = i32::MAX;
        params.adjust_max_steps(1);
        assert_eq!(params.max_steps, i32::MAX);
    }

    #[test]
    fn speed_never_goes_negative() {
        let mut params = RenderParams::new(&Config::default());
        params.adjust_camera_speed(-2.0);
        assert_eq!(params.camera_speed, 0.0);
        params.adjust_camera_speed(0.25);
        assert_eq!(params.camera_speed, 0.25);
    }
}
