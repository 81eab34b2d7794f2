use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tokio::time::{interval, sleep};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stewart_zenoh_runtime::config::{HOME_HEIGHT_MM, LOOP_HZ, TOPIC_CMD_POSE};
use stewart_zenoh_runtime::messages::PoseCommand;
use stewart_zenoh_runtime::platform::{LoggingServoBus, PlatformDriver, PlatformSolver, Pose};
use stewart_zenoh_runtime::trajectory::CircleSweep;
use stewart_zenoh_runtime::{runtime, teleop};

#[derive(Parser)]
#[command(name = "stewart-zenoh-runtime")]
#[command(about = "Six-leg Stewart platform pose runtime and test tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PoseArgs {
    /// Translation along x (mm)
    #[arg(short, long, default_value_t = 0.0)]
    x: f64,

    /// Translation along y (mm)
    #[arg(short, long, default_value_t = 0.0)]
    y: f64,

    /// Platform height (mm)
    #[arg(short, long, default_value_t = HOME_HEIGHT_MM)]
    z: f64,

    /// Rotation about x (degrees)
    #[arg(long, default_value_t = 0.0)]
    roll: f64,

    /// Rotation about y (degrees)
    #[arg(long, default_value_t = 0.0)]
    pitch: f64,

    /// Rotation about z (degrees)
    #[arg(long, default_value_t = 0.0)]
    yaw: f64,
}

impl PoseArgs {
    fn pose(&self) -> Pose {
        Pose {
            x: self.x,
            y: self.y,
            z: self.z,
            roll: self.roll,
            pitch: self.pitch,
            yaw: self.yaw,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the 50 Hz pose runtime
    Run,

    /// Hold one pose until interrupted
    Set {
        #[command(flatten)]
        pose: PoseArgs,
    },

    /// Sweep the platform tilt around a circle at the home height
    Circle {
        /// Tilt amplitude (degrees)
        #[arg(short, long, default_value_t = 5.8)]
        radius: f64,

        /// Poses per revolution
        #[arg(short, long, default_value_t = 100)]
        steps: usize,

        /// Seconds between poses
        #[arg(short, long, default_value_t = 0.05)]
        period: f64,
    },

    /// Solve a pose offline and print the pipeline report
    Solve {
        #[command(flatten)]
        pose: PoseArgs,
    },

    /// Keyboard pose teleop
    Teleop,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run => runtime::run().await,
        Command::Set { pose } => hold_pose(pose.pose()).await,
        Command::Circle {
            radius,
            steps,
            period,
        } => circle_sweep(radius, steps, period).await,
        Command::Solve { pose } => solve_report(pose.pose()),
        Command::Teleop => teleop::run().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Publish one pose at the loop rate until ctrl-c; the runtime watchdog
/// recenters the platform as soon as we stop.
async fn hold_pose(pose: Pose) -> CliResult {
    // Reject bad poses here rather than watching the runtime do it
    let solver = PlatformSolver::with_default_rig()?;
    let solution = solver.solve(&pose)?;
    for (servo, fault) in solution.faults() {
        warn!("servo {} will not move: {}", servo, fault);
    }

    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_POSE).await?;
    let cmd = serde_json::to_string(&PoseCommand::from(&pose))?;

    info!("Holding pose {:?} (ctrl-c to release)", pose);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Released");
                return Ok(());
            }
        }
        publisher.put(cmd.clone()).await?;
    }
}

/// The rig's standard motion test: settle at home, then sweep revolutions
/// until interrupted. Cancellation is only checked between poses.
async fn circle_sweep(radius: f64, steps: usize, period: f64) -> CliResult {
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_POSE).await?;

    let sweep = CircleSweep::new(radius, steps);
    if sweep.radius_deg() < radius {
        warn!("Radius clamped to {} deg", sweep.radius_deg());
    }

    // Let the platform settle level before tilting, feeding the watchdog
    // the whole time
    info!("Settling at home pose...");
    let home = serde_json::to_string(&PoseCommand::from(&Pose::home()))?;
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    for _ in 0..(2 * LOOP_HZ) {
        tick.tick().await;
        publisher.put(home.clone()).await?;
    }

    info!(
        "Sweeping: {} deg tilt, {} poses/rev, {}s period (ctrl-c to stop)",
        sweep.radius_deg(),
        steps,
        period
    );
    loop {
        for pose in sweep.poses() {
            tokio::select! {
                _ = sleep(Duration::from_secs_f64(period)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Sweep stopped");
                    return Ok(());
                }
            }
            publisher.put(serde_json::to_string(&PoseCommand::from(&pose))?).await?;
        }
    }
}

/// Run the full pipeline through the simulation bus and print what each
/// channel would do.
fn solve_report(pose: Pose) -> CliResult {
    let solver = PlatformSolver::with_default_rig()?;
    let mut driver = PlatformDriver::new(solver, LoggingServoBus);

    let solution = driver.apply_pose(&pose)?;

    println!("pose: {:?}", pose);
    for servo in 0..solution.leg_lengths.len() {
        match &solution.channels[servo] {
            Ok(command) => println!(
                "  leg {}: length {:8.3} mm -> command {:7.3} deg",
                servo, solution.leg_lengths[servo], command
            ),
            Err(fault) => println!(
                "  leg {}: length {:8.3} mm -> FAULT: {}",
                servo, solution.leg_lengths[servo], fault
            ),
        }
    }
    Ok(())
}
