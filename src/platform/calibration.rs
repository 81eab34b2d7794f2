// Per-servo mechanical calibration
//
// Servos are mounted in mirrored pairs: even channels rotate with the leg,
// odd channels against it. Each channel also carries a fixed deviation that
// levels the horn at center. Raw horn angles live in [-90, 90]; the actuator
// command domain is [0, 180] with 90 as the centered horn.

use super::geometry::LEG_COUNT;

/// Actuator command domain (degrees)
pub const SERVO_MIN_DEG: f64 = 0.0;
pub const SERVO_MAX_DEG: f64 = 180.0;

/// Command angle of a centered horn
pub const SERVO_CENTER_DEG: f64 = 90.0;

/// Calibrated command left the actuator's physical range; that channel is
/// skipped, the remaining channels are unaffected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("servo {servo}: command {command:.3} outside [0, 180]")]
pub struct OutOfRangeError {
    pub servo: usize,
    pub command: f64,
}

/// Per-servo deviation table; configuration data, owned by the solver and
/// read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    deviations: [f64; LEG_COUNT],
}

impl CalibrationTable {
    pub fn new(deviations: [f64; LEG_COUNT]) -> Self {
        Self { deviations }
    }

    /// Map a raw horn angle to the actuator command for `servo` (0..5).
    ///
    /// Odd channels mirror the angle and their deviation; the result is
    /// re-centered from the [-90, 90] horn domain onto [0, 180].
    pub fn command_angle(&self, servo: usize, raw: f64) -> Result<f64, OutOfRangeError> {
        debug_assert!(servo < LEG_COUNT);

        let (signed, deviation) = if servo % 2 == 0 {
            (raw, self.deviations[servo])
        } else {
            (-raw, -self.deviations[servo])
        };
        let command = signed + deviation + SERVO_CENTER_DEG;

        if !(SERVO_MIN_DEG..=SERVO_MAX_DEG).contains(&command) {
            return Err(OutOfRangeError { servo, command });
        }
        Ok(command)
    }
}
