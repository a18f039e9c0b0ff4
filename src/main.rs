// SPDX-License-Identifier: MPL-2.0
//! Scripted walkthrough of the scheduler.
//!
//! Pushes a short sequence of notifications, plays the renderer's part by
//! acknowledging exit animations, and prints every lifecycle hook until the
//! stream is empty.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use toast_scheduler::config::{self, Config};
use toast_scheduler::notifications::{
    Lifetime, Message, PauseTrigger, Position, Push, PushOptions, StoreEvent,
};
use toast_scheduler::{Notifier, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
toast_scheduler demo

USAGE:
  toast_scheduler [OPTIONS]

OPTIONS:
  --config <PATH>      Load settings from PATH instead of the default location
  --limit <N>          Maximum visible notifications per position
  --position <NAME>    Default position, e.g. top-center or bottom-right
  -h, --help           Print this help
";

/// Simulated exit animation length.
const LEAVE_ANIMATION: Duration = Duration::from_millis(250);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

struct Flags {
    config: Option<PathBuf>,
    limit: Option<usize>,
    position: Option<Position>,
}

fn parse_position(name: &str) -> std::result::Result<Position, String> {
    Position::from_name(name).ok_or_else(|| format!("unknown position '{name}'"))
}

fn parse_flags() -> std::result::Result<Option<Flags>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(None);
    }

    let flags = Flags {
        config: args.opt_value_from_str("--config")?,
        limit: args.opt_value_from_str("--limit")?,
        position: args.opt_value_from_fn("--position", parse_position)?,
    };

    let rest = args.finish();
    if !rest.is_empty() {
        warn!(?rest, "ignoring unused arguments");
    }
    Ok(Some(flags))
}

fn load_config(flags: &Flags) -> Result<Config> {
    let mut config = match &flags.config {
        Some(path) => config::load_from_path(path)?,
        None => {
            let (config, warning) = config::load();
            if let Some(warning) = warning {
                warn!("{warning}");
            }
            config
        }
    };

    if let Some(limit) = flags.limit {
        config.layout.max_visible = Some(limit);
    }
    if let Some(position) = flags.position {
        config.layout.position = position;
    }
    config.validate()?;
    Ok(config)
}

async fn play_script(push: Push) {
    push.info(
        PushOptions::new()
            .with_title("Sync")
            .with_message("Connected to server")
            .with_duration(Lifetime::from_millis(1500)),
    );
    push.warning(
        PushOptions::new()
            .with_message("Disk almost full")
            .with_duration(Lifetime::from_millis(2500)),
    );
    let upload = push.promise(
        PushOptions::new()
            .with_title("Upload")
            .with_message("Uploading report.pdf"),
    );
    push.error(
        PushOptions::new()
            .with_message("Printer offline")
            .with_duration(Lifetime::from_millis(2000))
            .skip_queue(),
    );

    tokio::time::sleep(Duration::from_millis(400)).await;
    info!("pointer enters the stream");
    push.pause_all(PauseTrigger::Hover);
    tokio::time::sleep(Duration::from_millis(700)).await;
    info!("pointer leaves the stream");
    push.resume_all(PauseTrigger::Hover);

    tokio::time::sleep(Duration::from_millis(800)).await;
    upload.resolve(
        PushOptions::new()
            .with_message("Uploaded report.pdf")
            .with_duration(Lifetime::from_millis(1200)),
    );
    push.success(
        PushOptions::new()
            .with_message("All done")
            .with_position(Position::BottomRight)
            .with_duration(Lifetime::from_millis(1000)),
    );
}

fn describe(event: &StoreEvent) -> String {
    match event {
        StoreEvent::Admitted { id, animation } => format!("{id} visible ({animation})"),
        StoreEvent::Queued { id } => format!("{id} queued"),
        StoreEvent::Updated { id, kind } => format!("{id} updated to {kind}"),
        StoreEvent::Duplicated { id, count } => format!("{id} duplicated x{count}"),
        StoreEvent::Paused { id } => format!("{id} paused"),
        StoreEvent::Resumed { id } => format!("{id} resumed"),
        StoreEvent::Clearing { id, animation } if animation.is_empty() => {
            format!("{id} clearing")
        }
        StoreEvent::Clearing { id, animation } => format!("{id} clearing ({animation})"),
        StoreEvent::Destroyed { id } => format!("{id} destroyed"),
    }
}

/// How the event stream ended.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    /// Script finished and every notification is gone.
    Drained,
    /// No event arrived within the idle timeout.
    Idle,
    Closed,
}

/// Prints events and acknowledges exit animations until the stream drains.
async fn follow(
    push: &Push,
    events: &mut mpsc::UnboundedReceiver<StoreEvent>,
    script: &JoinHandle<()>,
    idle: Duration,
) -> Outcome {
    let has_items = push.has_items();
    let start = tokio::time::Instant::now();

    loop {
        let event = match tokio::time::timeout(idle, events.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => return Outcome::Closed,
            Err(_) => return Outcome::Idle,
        };

        println!(
            "[{:>5} ms] {}",
            start.elapsed().as_millis(),
            describe(&event)
        );

        if let StoreEvent::Clearing { id, animation } = event {
            if !animation.is_empty() {
                let renderer = push.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(LEAVE_ANIMATION).await;
                    renderer.send(Message::AnimationEnd(id));
                });
            }
        }

        if script.is_finished() && !*has_items.borrow() {
            return Outcome::Drained;
        }
    }
}

async fn run(flags: Flags) -> Result<ExitCode> {
    let config = load_config(&flags)?;
    let notifier = Notifier::spawn(config)?;
    let push = notifier.push();
    let mut events = push.subscribe();

    let script = tokio::spawn(play_script(push.clone()));
    let outcome = follow(&push, &mut events, &script, IDLE_TIMEOUT).await;
    script.abort();

    match outcome {
        Outcome::Drained => {
            info!("notification stream is empty");
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Idle => {
            error!(
                "no store activity for {}s, giving up",
                IDLE_TIMEOUT.as_secs()
            );
            Ok(ExitCode::FAILURE)
        }
        Outcome::Closed => {
            error!("event stream closed unexpectedly");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let flags = match parse_flags() {
        Ok(Some(flags)) => flags,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprint!("{HELP}");
            return ExitCode::FAILURE;
        }
    };

    match run(flags).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
