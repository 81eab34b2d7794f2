// Circular sweep trajectory
//
// The rig's standard motion test: hold the home height and roll the top
// plate around a cone, roll = radius*cos(phi), pitch = radius*sin(phi).
// The generator is pure; pacing and cancellation belong to the caller,
// which must only stop between poses so the platform is never left on a
// half-updated tick.

use std::f64::consts::TAU;

use crate::platform::kinematics::{Pose, ROTATION_LIMIT_DEG};

/// One revolution of tilt poses around the level home pose
#[derive(Debug, Clone)]
pub struct CircleSweep {
    radius_deg: f64,
    steps: usize,
    home: Pose,
}

impl CircleSweep {
    /// `radius_deg` is the tilt amplitude in degrees, `steps` the number of
    /// poses per revolution. The amplitude is clamped to the solver's
    /// rotation envelope so every generated pose is valid.
    pub fn new(radius_deg: f64, steps: usize) -> Self {
        Self {
            radius_deg: radius_deg.clamp(0.0, ROTATION_LIMIT_DEG),
            steps,
            home: Pose::home(),
        }
    }

    pub fn radius_deg(&self) -> f64 {
        self.radius_deg
    }

    /// Poses for one revolution, starting at phi = 0 (full roll, no pitch)
    pub fn poses(&self) -> impl Iterator<Item = Pose> + '_ {
        (0..self.steps).map(move |step| {
            let phi = TAU * step as f64 / self.steps as f64;
            Pose {
                roll: self.radius_deg * phi.cos(),
                pitch: self.radius_deg * phi.sin(),
                ..self.home
            }
        })
    }
}
