// Keyboard teleop: W/S pitch, A/D roll, Z/X yaw, T/G height, R/F step size,
// C recenter, Q quit
//
// Unlike a velocity base there is nothing to zero out on idle: the platform
// holds whatever pose was last commanded, so the loop just republishes the
// current pose at the runtime rate to keep the watchdog fed.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;

use crate::config::TOPIC_CMD_POSE;
use crate::messages::PoseCommand;
use crate::platform::kinematics::{
    Pose, ROTATION_LIMIT_DEG, TRANSLATION_MAX_MM, TRANSLATION_MIN_MM,
};

const TILT_STEPS_DEG: [f64; 3] = [0.5, 1.5, 3.0];
const HEIGHT_STEPS_MM: [f64; 3] = [1.0, 3.0, 6.0];

pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_POSE).await?;

    info!("Controls: W/S=pitch, A/D=roll, Z/X=yaw, T/G=height, R/F=step, C=center, Q=quit");
    print_step(0);

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut step_idx: usize = 0;
    let mut pose = Pose::home();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let tilt = TILT_STEPS_DEG[step_idx];
                let height = HEIGHT_STEPS_MM[step_idx];

                match code {
                    KeyCode::Char('w') if pressed => pose.pitch += tilt,
                    KeyCode::Char('s') if pressed => pose.pitch -= tilt,
                    KeyCode::Char('a') if pressed => pose.roll -= tilt,
                    KeyCode::Char('d') if pressed => pose.roll += tilt,
                    KeyCode::Char('z') if pressed => pose.yaw -= tilt,
                    KeyCode::Char('x') if pressed => pose.yaw += tilt,
                    KeyCode::Char('t') if pressed => pose.z += height,
                    KeyCode::Char('g') if pressed => pose.z -= height,

                    KeyCode::Char('c') if pressed => {
                        pose = Pose::home();
                        info!("Recentered");
                    }

                    // Step size control
                    KeyCode::Char('r') if pressed => {
                        step_idx = (step_idx + 1).min(TILT_STEPS_DEG.len() - 1);
                        print_step(step_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        step_idx = step_idx.saturating_sub(1);
                        print_step(step_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }

                clamp_to_envelope(&mut pose);
            }
        }

        // Always publish at ~50Hz so the runtime watchdog stays fed
        let cmd = PoseCommand::from(&pose);
        publisher.put(serde_json::to_string(&cmd)?).await?;
    }

    Ok(())
}

// Keep the commanded pose inside the solver envelope; the runtime would
// reject anything outside it anyway
fn clamp_to_envelope(pose: &mut Pose) {
    pose.z = pose.z.clamp(TRANSLATION_MIN_MM, TRANSLATION_MAX_MM);
    pose.roll = pose.roll.clamp(-ROTATION_LIMIT_DEG, ROTATION_LIMIT_DEG);
    pose.pitch = pose.pitch.clamp(-ROTATION_LIMIT_DEG, ROTATION_LIMIT_DEG);
    pose.yaw = pose.yaw.clamp(-ROTATION_LIMIT_DEG, ROTATION_LIMIT_DEG);
}

fn print_step(idx: usize) {
    let label = ["FINE", "MED", "COARSE"][idx];
    info!(
        "Step: {} ({} deg / {} mm)",
        label, TILT_STEPS_DEG[idx], HEIGHT_STEPS_MM[idx]
    );
}
