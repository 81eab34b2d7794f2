// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::platform::LEG_COUNT;
use crate::platform::calibration::SERVO_CENTER_DEG;
use crate::platform::kinematics::Pose;

// Pose command from teleop/scripts -> runtime
// Translation in millimeters, rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseCommand {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl From<&PoseCommand> for Pose {
    fn from(cmd: &PoseCommand) -> Self {
        Self {
            x: cmd.x,
            y: cmd.y,
            z: cmd.z,
            roll: cmd.roll,
            pitch: cmd.pitch,
            yaw: cmd.yaw,
        }
    }
}

impl From<&Pose> for PoseCommand {
    fn from(pose: &Pose) -> Self {
        Self {
            x: pose.x,
            y: pose.y,
            z: pose.z,
            roll: pose.roll,
            pitch: pose.pitch,
            yaw: pose.yaw,
        }
    }
}

// Actuation output from runtime -> servo driver process
// One command angle per channel, in the actuator's 0..180 degree domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoActuation {
    pub angles: [f64; LEG_COUNT],
}

impl Default for ServoActuation {
    // Centered horns, the rig's mechanical home posture
    fn default() -> Self {
        Self {
            angles: [SERVO_CENTER_DEG; LEG_COUNT],
        }
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    PoseRejected,
    Degraded,
}
