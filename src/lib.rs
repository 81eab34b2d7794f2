// Stewart platform pose runtime
//
// The kinematics core lives in `platform` (geometry, pose solver, horn
// conversion, calibration); `runtime` wraps it in a 50 Hz Zenoh loop with a
// watchdog. `trajectory` and `teleop` are the pose sources shipped with the
// rig.

pub mod config;
pub mod messages;
pub mod platform;
pub mod runtime;
pub mod teleop;
pub mod trajectory;
