// Pose-to-actuation pipeline for the Stewart platform
//
// Provides:
// - Anchor geometry for the base and moving platform rings
// - Inverse kinematics (pose -> leg lengths -> horn angles)
// - Per-servo calibration into the actuator command domain
// - The one-tick pipeline and the servo bus seam

pub mod calibration;
mod driver;
pub mod geometry;
pub mod kinematics;

pub use calibration::{CalibrationTable, OutOfRangeError};
pub use driver::{
    BusError, ChannelFault, LoggingServoBus, PlatformDriver, PlatformSolver, ServoBus,
    TickSolution,
};
pub use geometry::{ConfigError, LEG_COUNT, PlatformGeometry};
pub use kinematics::{LegError, Pose, RangeError, horn_angles, leg_lengths};
