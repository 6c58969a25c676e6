// CONTROLLER: Input, camera control and the frame loop
pub mod input;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{InputEvent, InputProcessor, InputState, Key};
pub use camera_controller::CameraController;
pub use frame_loop::{FrameLoopContext, LoopState, Presenter};
