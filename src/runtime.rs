// 50 Hz loop with watchdog
// If teleop or a trajectory script crashes and stops sending poses, the
// watchdog recenters the platform instead of holding a stale command
// forever. One tick runs the whole pose -> lengths -> angles -> commands
// pipeline before the next tick may start, so the published actuation is
// always a single consistent solution.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

// local imports
use crate::config::{CMD_TIMEOUT, LOOP_HZ, TOPIC_CMD_POSE, TOPIC_HEALTH, TOPIC_RT_SERVO};
use crate::messages::{PoseCommand, RuntimeHealth, ServoActuation};
use crate::platform::{ConfigError, PlatformSolver, Pose};

pub struct Runtime {
    solver: PlatformSolver,
    latest_cmd: Option<PoseCommand>,
    cmd_received_at: Instant,
    last_actuation: ServoActuation,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            solver: PlatformSolver::with_default_rig()?,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            last_actuation: ServoActuation::default(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        })
    }

    /// Process incoming command
    fn on_command(&mut self, cmd: PoseCommand) {
        debug!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = Instant::now();
    }

    /// Compute actuation based on watchdog state and the current pose
    fn compute_actuation(&mut self) -> ServoActuation {
        let cmd_age = self.cmd_received_at.elapsed();

        let cmd = match self.latest_cmd {
            Some(cmd) if cmd_age <= CMD_TIMEOUT => cmd,
            had_cmd => {
                // Watchdog triggered - recenter to the home posture
                if self.health != RuntimeHealth::CmdStale && had_cmd.is_some() {
                    warn!("Command stale ({:?} old), recentering platform", cmd_age);
                }
                self.health = RuntimeHealth::CmdStale;
                self.last_actuation = ServoActuation::default();
                return self.last_actuation;
            }
        };
        let pose = Pose::from(&cmd);
        match self.solver.solve(&pose) {
            Ok(solution) => {
                // Faulted channels hold their last good command; the legs
                // that solved keep moving
                let mut actuation = self.last_actuation;
                let mut fault_count = 0;
                for (servo, channel) in solution.channels.iter().enumerate() {
                    match channel {
                        Ok(angle) => actuation.angles[servo] = *angle,
                        Err(fault) => {
                            fault_count += 1;
                            debug!("servo {} holding last command: {}", servo, fault);
                        }
                    }
                }
                let health = if fault_count == 0 {
                    RuntimeHealth::Ok
                } else {
                    RuntimeHealth::Degraded
                };
                if health != self.health && health == RuntimeHealth::Degraded {
                    warn!("{} of 6 channels faulted, holding their last commands", fault_count);
                }
                self.health = health;
                self.last_actuation = actuation;
                actuation
            }
            Err(e) => {
                // Whole tick rejected; hold the last consistent actuation
                if self.health != RuntimeHealth::PoseRejected {
                    warn!("Pose rejected: {}", e);
                }
                self.health = RuntimeHealth::PoseRejected;
                self.last_actuation
            }
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_POSE).await?;
    let pub_actuation = session.declare_publisher(TOPIC_RT_SERVO).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut runtime = Runtime::new()?;
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_POSE);
    info!("Publishing to: {}, {}", TOPIC_RT_SERVO, TOPIC_HEALTH);

    loop {
        // Shutdown is only observed between ticks; a cancelled run leaves
        // the platform at the last fully-computed pose
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, holding last published pose");
                break;
            }
        }

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<PoseCommand>(&payload) {
                Ok(cmd) => {
                    runtime.on_command(cmd);
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Compute actuation (watchdog + full kinematics pipeline)
        let actuation = runtime.compute_actuation();

        // 3. Publish actuation
        let actuation_json = serde_json::to_string(&actuation)?;
        pub_actuation.put(actuation_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health)?;
        pub_health.put(health_json).await?;
    }

    Ok(())
}
