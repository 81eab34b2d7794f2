// High-level pose pipeline for the platform
//
// Combines the geometry model, pose solver, horn conversion and calibration
// into one control tick, and drives a servo bus with the channels that
// solved. The bus itself (PCA9685 behind I2C on this rig) lives in a
// separate process; `ServoBus` is the seam it plugs into.

use tracing::{debug, info, warn};

use super::calibration::{CalibrationTable, OutOfRangeError, SERVO_CENTER_DEG};
use super::geometry::{ConfigError, LEG_COUNT, PlatformGeometry};
use super::kinematics::{LegError, Pose, RangeError, horn_angles, leg_lengths};
use crate::config::{
    BASE_ANGLES_DEG, BASE_RADIUS_MM, HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, PLATFORM_ANGLES_DEG,
    PLATFORM_RADIUS_MM, SERVO_DEVIATIONS_DEG,
};

/// Downstream actuator contract: one rotation command per servo channel,
/// angle in the 0..180 degree domain. Unknown indices are the
/// implementation's concern.
pub trait ServoBus {
    fn set_rotation_angle(&mut self, servo: usize, angle_deg: f64) -> Result<(), BusError>;
}

/// Error types for servo bus implementations
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("servo bus io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("servo {servo} rejected angle {angle:.1}")]
    Rejected { servo: usize, angle: f64 },
}

/// Simulation sink: logs every command instead of driving hardware
#[derive(Debug, Default)]
pub struct LoggingServoBus;

impl ServoBus for LoggingServoBus {
    fn set_rotation_angle(&mut self, servo: usize, angle_deg: f64) -> Result<(), BusError> {
        debug!("servo {} -> {:.2} deg", servo, angle_deg);
        Ok(())
    }
}

/// Anything that can take a single channel out of a tick without touching
/// its siblings
#[derive(Debug, thiserror::Error)]
pub enum ChannelFault {
    #[error(transparent)]
    Conversion(#[from] LegError),

    #[error(transparent)]
    Calibration(#[from] OutOfRangeError),

    #[error("servo {servo}: bus fault: {source}")]
    Bus { servo: usize, source: BusError },
}

/// One fully solved control tick: the leg lengths plus, per channel, either
/// the calibrated command angle or the fault that took the channel out.
#[derive(Debug)]
pub struct TickSolution {
    pub leg_lengths: [f64; LEG_COUNT],
    pub channels: [Result<f64, ChannelFault>; LEG_COUNT],
}

impl TickSolution {
    /// Command angles for the channels that solved, index-aligned
    pub fn commands(&self) -> [Option<f64>; LEG_COUNT] {
        std::array::from_fn(|i| self.channels[i].as_ref().ok().copied())
    }

    /// Faulted channels with their indices
    pub fn faults(&self) -> impl Iterator<Item = (usize, &ChannelFault)> {
        self.channels
            .iter()
            .enumerate()
            .filter_map(|(i, channel)| channel.as_ref().err().map(|fault| (i, fault)))
    }

    pub fn is_complete(&self) -> bool {
        self.channels.iter().all(Result::is_ok)
    }
}

/// Pose-to-command solver for one rig: geometry, horn dimensions and
/// calibration, immutable after construction.
#[derive(Debug, Clone)]
pub struct PlatformSolver {
    geometry: PlatformGeometry,
    horn_length: f64,
    leg_link_length: f64,
    calibration: CalibrationTable,
}

impl PlatformSolver {
    pub fn new(
        geometry: PlatformGeometry,
        horn_length: f64,
        leg_link_length: f64,
        calibration: CalibrationTable,
    ) -> Self {
        Self {
            geometry,
            horn_length,
            leg_link_length,
            calibration,
        }
    }

    /// Solver for the rig constants in `config`
    pub fn with_default_rig() -> Result<Self, ConfigError> {
        let geometry = PlatformGeometry::new(
            BASE_RADIUS_MM,
            &BASE_ANGLES_DEG,
            PLATFORM_RADIUS_MM,
            &PLATFORM_ANGLES_DEG,
        )?;
        Ok(Self::new(
            geometry,
            HORN_LENGTH_MM,
            LEG_LINK_LENGTH_MM,
            CalibrationTable::new(SERVO_DEVIATIONS_DEG),
        ))
    }

    /// Run the four pipeline stages for one pose.
    ///
    /// A pose outside the envelope rejects the tick as a whole; everything
    /// past that point degrades per channel.
    pub fn solve(&self, pose: &Pose) -> Result<TickSolution, RangeError> {
        let lengths = leg_lengths(&self.geometry, pose)?;
        let raw_angles = horn_angles(self.horn_length, self.leg_link_length, &lengths);

        let channels = std::array::from_fn(|servo| -> Result<f64, ChannelFault> {
            let raw = raw_angles[servo].clone()?;
            Ok(self.calibration.command_angle(servo, raw)?)
        });

        Ok(TickSolution {
            leg_lengths: lengths,
            channels,
        })
    }
}

/// Solver plus the servo bus it actuates
pub struct PlatformDriver<B: ServoBus> {
    solver: PlatformSolver,
    bus: B,
}

impl<B: ServoBus> PlatformDriver<B> {
    pub fn new(solver: PlatformSolver, bus: B) -> Self {
        Self { solver, bus }
    }

    pub fn solver(&self) -> &PlatformSolver {
        &self.solver
    }

    /// Solve a pose and actuate every channel that produced a command.
    ///
    /// Faulted channels are logged and skipped so one miscalibrated or
    /// extreme-pose leg never stalls the other five; a bus failure is folded
    /// into that channel's slot the same way.
    pub fn apply_pose(&mut self, pose: &Pose) -> Result<TickSolution, RangeError> {
        let mut solution = self.solver.solve(pose)?;

        for servo in 0..LEG_COUNT {
            let angle = match &solution.channels[servo] {
                Ok(angle) => *angle,
                Err(fault) => {
                    warn!("servo {} skipped: {}", servo, fault);
                    continue;
                }
            };
            if let Err(source) = self.bus.set_rotation_angle(servo, angle) {
                warn!("servo {} bus fault: {}", servo, source);
                solution.channels[servo] = Err(ChannelFault::Bus { servo, source });
            }
        }
        Ok(solution)
    }

    /// Drive every horn to center (the rig's home posture)
    pub fn center(&mut self) -> Result<(), BusError> {
        info!("centering all servos");
        for servo in 0..LEG_COUNT {
            self.bus.set_rotation_angle(servo, SERVO_CENTER_DEG)?;
        }
        Ok(())
    }
}

impl<B: ServoBus> Drop for PlatformDriver<B> {
    fn drop(&mut self) {
        // Try to leave the platform level when the driver goes away
        if let Err(e) = self.center() {
            warn!("Failed to center servos on drop: {}", e);
        }
    }
}
