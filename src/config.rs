use std::path::PathBuf;
use std::time::Duration;

use glam::Vec3;

/// Startup configuration. Every tunable the demo has lives here; there are
/// no CLI flags or config files, so `Config::default()` is the configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub window: WindowConfig,
    pub shaders: ShaderPaths,
    pub render: RenderDefaults,
    pub camera: CameraDefaults,
    pub input: InputTuning,
    pub limits: ParamLimits,
    pub vsync: bool,
    /// Minimum wall time between two FPS title updates
    pub fps_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// Shader sources, resolved against the working directory
#[derive(Debug, Clone)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderDefaults {
    pub near: f32,
    pub far: f32,
    pub epsilon: f32,
    pub max_steps: i32,
    pub focal_length: f32,
    pub camera_speed: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraDefaults {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct InputTuning {
    /// Radians of rotation per pixel of pointer travel
    pub mouse_sensitivity: f32,
    /// Change of camera speed per scroll unit
    pub scroll_speed_step: f32,
}

/// Lower bounds for the user-adjustable render parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamLimits {
    pub min_max_steps: i32,
    pub min_camera_speed: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                title: "Volume Ray Casting".to_string(),
                width: 800,
                height: 600,
            },
            shaders: ShaderPaths {
                vertex: PathBuf::from("shaders/raymarch.vert"),
                fragment: PathBuf::from("shaders/test.frag"),
            },
            render: RenderDefaults {
                near: 0.001,
                far: 10000.0,
                epsilon: 0.001,
                max_steps: 64,
                focal_length: 1.67,
                camera_speed: 0.5,
            },
            camera: CameraDefaults {
                eye: Vec3::new(0.0, 0.0, 2.0),
                yaw: 0.0,
                pitch: 0.0,
            },
            input: InputTuning {
                mouse_sensitivity: 0.005,
                scroll_speed_step: 0.02,
            },
            limits: ParamLimits {
                min_max_steps: 1,
                min_camera_speed: 0.0,
            },
            vsync: true,
            fps_interval: Duration::from_secs(1),
        }
    }
}
