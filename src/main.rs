#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod commands;
mod config;
mod flight_control;
mod gesture_link;
mod keychain;
mod logger;
mod session;

use crate::commands::Command;
use crate::config::GameConfig;
use crate::keychain::Keychain;
use std::{ops::ControlFlow, time::Duration};
use tokio::time::{self, Instant, MissedTickBehavior};

const REPORT_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match GameConfig::load() {
        Ok(config) => config,
        Err(e) => fatal!("Invalid configuration: {e:?}"),
    };
    info!(
        "Fixed step {:.3}s, {} frames per second, time limit {:.0}s.",
        config.timing.fixed_dt, config.timing.frame_rate, config.session.time_limit
    );
    let mut keychain = Keychain::new(config).await;
    run(&mut keychain).await;
    keychain.shutdown();
}

/// Drives the fixed and frame ticks on one thread until the run is left.
async fn run(keychain: &mut Keychain) {
    let mut fixed = time::interval(keychain.config().timing.fixed_period());
    let mut frame = time::interval(keychain.config().timing.frame_period());
    let mut report = time::interval(REPORT_PERIOD);
    fixed.set_missed_tick_behavior(MissedTickBehavior::Burst);
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut commands = Command::spawn_stdin_reader();
    let mut stdin_open = true;
    let mut last_frame = Instant::now();
    loop {
        let flow = tokio::select! {
            _ = fixed.tick() => {
                keychain.fixed_tick();
                ControlFlow::Continue(())
            }
            now = frame.tick() => {
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;
                keychain.frame_tick(dt)
            }
            _ = report.tick() => {
                keychain.report();
                ControlFlow::Continue(())
            }
            command = commands.recv(), if stdin_open => match command {
                Some(command) => keychain.handle(command),
                None => {
                    log!("Stdin closed, no further commands.");
                    stdin_open = false;
                    ControlFlow::Continue(())
                }
            },
        };
        if flow.is_break() {
            break;
        }
    }
}
