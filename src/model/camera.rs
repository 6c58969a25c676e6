use glam::{EulerRot, Quat, Vec3};

/// Pitch limit in radians (89 degrees), keeps the view from flipping over the poles
pub const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Free-fly camera: eye position plus yaw/pitch, no roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pitch: f32,
}

/// Orthonormal view basis derived from the camera orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn new(eye: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            eye,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
        }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Apply an orientation change in radians. Pitch is clamped afterwards.
    pub fn look(&mut self, dyaw: f32, dpitch: f32) {
        self.yaw += dyaw;
        self.set_pitch(self.pitch + dpitch);
    }

    /// Yaw about world up, then pitch about the rotated right axis.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Recomputed on every call, nothing is cached.
    pub fn basis(&self) -> CameraBasis {
        let rot = self.rotation();
        CameraBasis {
            front: rot * Vec3::NEG_Z,
            right: rot * Vec3::X,
            up: rot * Vec3::Y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn identity_orientation_looks_down_negative_z() {
        let cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        let basis = cam.basis();
        assert!(basis.front.abs_diff_eq(Vec3::NEG_Z, EPS));
        assert!(basis.right.abs_diff_eq(Vec3::X, EPS));
        assert!(basis.up.abs_diff_eq(Vec3::Y, EPS));
    }

    #[test]
    fn basis_is_orthonormal_over_the_pitch_range() {
        let limit_deg = 89i32;
        for yaw_deg in (-360..=360).step_by(15) {
            for pitch_deg in (-limit_deg..=limit_deg).step_by(7) {
                let cam = Camera::new(
                    Vec3::ZERO,
                    (yaw_deg as f32).to_radians(),
                    (pitch_deg as f32).to_radians(),
                );
                let CameraBasis { front, right, up } = cam.basis();
                for v in [front, right, up] {
                    assert!((v.length() - 1.0).abs() < 1e-4, "not unit: {v:?}");
                }
                assert!(front.dot(right).abs() < 1e-4);
                assert!(front.dot(up).abs() < 1e-4);
                assert!(right.dot(up).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn positive_pitch_looks_up_and_positive_yaw_turns_left() {
        let up = Camera::new(Vec3::ZERO, 0.0, 0.5).basis().front;
        assert!(up.y > 0.0);

        let left = Camera::new(Vec3::ZERO, 0.5, 0.0).basis().front;
        assert!(left.x < 0.0);
    }

    #[test]
    fn right_vector_stays_horizontal_without_roll() {
        let cam = Camera::new(Vec3::ZERO, 1.2, -0.7);
        assert!(cam.basis().right.y.abs() < EPS);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, 3.0);
        assert_eq!(cam.pitch(), PITCH_LIMIT);

        cam.look(0.0, -10.0);
        assert_eq!(cam.pitch(), -PITCH_LIMIT);
    }
}
