/// Platform-agnostic input handling
use std::collections::HashSet;

/// Keys the demo reacts to. Everything else is dropped when platform events
/// are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LeftShift,
    Plus,
    Minus,
    V,
    Escape,
}

/// Platform-independent input events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),

    /// Absolute pointer position. While the cursor is grabbed this is an
    /// unbounded virtual position, not a window coordinate.
    PointerMoved { x: f64, y: f64 },
    /// Vertical scroll in lines, positive away from the user
    Scroll { dy: f64 },

    FocusLost,
}

/// Held-key state, updated from input events
#[derive(Debug, Default)]
pub struct InputState {
    pressed_keys: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.pressed_keys.insert(*key);
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key);
            }
            InputEvent::FocusLost => self.clear_keys(),
            InputEvent::PointerMoved { .. } | InputEvent::Scroll { .. } => {}
        }
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: Key,
    pub backward: Key,
    pub left: Key,
    pub right: Key,
    pub up: Key,
    pub down: Key,
    pub more_steps: Key,
    pub fewer_steps: Key,
    pub toggle_vsync: Key,
    pub quit: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: Key::W,
            backward: Key::S,
            left: Key::A,
            right: Key::D,
            up: Key::Space,
            down: Key::LeftShift,
            more_steps: Key::Plus,
            fewer_steps: Key::Minus,
            toggle_vsync: Key::V,
            quit: Key::Escape,
        }
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.forward)
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.backward)
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.left)
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.right)
    }

    pub fn is_moving_up(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.up)
    }

    pub fn is_moving_down(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.down)
    }

    /// Net step-cap change requested this frame, `None` when neither key is held
    pub fn step_change(&self, input: &InputState) -> Option<i32> {
        let more = input.is_key_pressed(self.bindings.more_steps);
        let fewer = input.is_key_pressed(self.bindings.fewer_steps);
        if !more && !fewer {
            return None;
        }
        Some(i32::from(more) - i32::from(fewer))
    }

    pub fn wants_to_toggle_vsync(&self, key: Key) -> bool {
        key == self.bindings.toggle_vsync
    }

    pub fn wants_to_quit(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.quit)
    }
}

/// Translation of winit events
pub mod native {
    use super::*;
    use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
    use winit::keyboard::{KeyCode, PhysicalKey};

    /// Pixel scroll deltas (touchpads) per line of wheel scroll
    const PIXELS_PER_LINE: f64 = 20.0;

    pub fn key_from_code(code: KeyCode) -> Option<Key> {
        match code {
            KeyCode::KeyW => Some(Key::W),
            KeyCode::KeyA => Some(Key::A),
            KeyCode::KeyS => Some(Key::S),
            KeyCode::KeyD => Some(Key::D),
            KeyCode::Space => Some(Key::Space),
            KeyCode::ShiftLeft => Some(Key::LeftShift),
            KeyCode::Equal | KeyCode::NumpadAdd => Some(Key::Plus),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(Key::Minus),
            KeyCode::KeyV => Some(Key::V),
            KeyCode::Escape => Some(Key::Escape),
            _ => None,
        }
    }

    /// Map a window event to an input event. Key repeats are dropped so that
    /// `KeyDown` only fires on the actual press.
    pub fn window_event_to_input(event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let key = key_from_code(*code)?;
                match state {
                    ElementState::Pressed if *repeat => None,
                    ElementState::Pressed => Some(InputEvent::KeyDown(key)),
                    ElementState::Released => Some(InputEvent::KeyUp(key)),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => f64::from(*y),
                    MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_LINE,
                };
                Some(InputEvent::Scroll { dy })
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        }
    }

    /// Sum of raw mouse motion, the pointer position of a grabbed cursor
    #[derive(Debug, Default, Clone, Copy)]
    pub struct VirtualCursor {
        x: f64,
        y: f64,
    }

    impl VirtualCursor {
        pub fn motion(&mut self, dx: f64, dy: f64) -> InputEvent {
            self.x += dx;
            self.y += dy;
            InputEvent::PointerMoved {
                x: self.x,
                y: self.y,
            }
        }
    }
}
