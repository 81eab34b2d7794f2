// Timeouts, topics, rig configuration
use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_POSE: &str = "stewart/cmd/pose"; // pose commands
pub const TOPIC_RT_SERVO: &str = "stewart/rt/servo"; // actuation
pub const TOPIC_HEALTH: &str = "stewart/state/health"; // health status

// Rig geometry
// Anchor rings as measured on the assembled platform. Legs are paired
// around the ring; index i on the base connects to index i on the platform.
pub const BASE_RADIUS_MM: f64 = 100.0;
pub const BASE_ANGLES_DEG: [f64; 6] = [340.0, 20.0, 100.0, 140.0, 240.0, 280.0];
pub const PLATFORM_RADIUS_MM: f64 = 100.0;
pub const PLATFORM_ANGLES_DEG: [f64; 6] = [350.0, 10.0, 110.0, 130.0, 250.0, 270.0];

// Horn (servo arm) and connecting link lengths
pub const HORN_LENGTH_MM: f64 = 40.0;
pub const LEG_LINK_LENGTH_MM: f64 = 100.0;

// Resting platform height with all horns level
pub const HOME_HEIGHT_MM: f64 = 94.0;

// Per-servo deviation so that the horn axis sits horizontal at center.
// Even channels are on the right side of each leg pair, odd on the left.
pub const SERVO_DEVIATIONS_DEG: [f64; 6] = [8.0, 5.0, 6.0, 8.0, 7.0, 2.0];
