//! Focus session commands.
//!
//! `focus run` drives a live session from the terminal. Attention changes
//! are typed on stdin since a terminal has no window focus events; every
//! engine event is printed to stdout as one JSON line.

use clap::Subcommand;
use devpool_core::storage::Database;
use devpool_core::{
    AppStore, AttentionSignal, Config, ConfiguredCoach, DriverCommand, DriverOutput, FocusEngine,
    FocusRoom, SessionDriver,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Notify};

use super::{current_profile, require_profile, CliResult};
use crate::notifier::StderrNotifier;

#[derive(Subcommand)]
pub enum FocusAction {
    /// Run an interactive focus session
    ///
    /// Commands on stdin: blur|hidden|b, focus|visible|f, status|s, stop|q
    Run {
        /// Session length in seconds
        #[arg(long)]
        duration: Option<u32>,
        /// Seed for the focus random walk
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List recorded sessions, newest first
    History {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Aggregate focus statistics
    Stats,
}

pub fn run(action: FocusAction) -> CliResult {
    match action {
        FocusAction::Run { duration, seed } => run_session(duration, seed),
        FocusAction::History { limit } => {
            let db = Database::open()?;
            let profile = require_profile(&db)?;
            let sessions = db.list_focus_sessions(&profile.user_id, limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
            Ok(())
        }
        FocusAction::Stats => {
            let db = Database::open()?;
            let profile = require_profile(&db)?;
            let stats = db.focus_stats(&profile.user_id)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

fn run_session(duration: Option<u32>, seed: Option<u64>) -> CliResult {
    let mut config = Config::load()?;
    if let Some(duration) = duration {
        config.session.duration_secs = duration;
    }
    if seed.is_some() {
        config.session.seed = seed;
    }
    config.session.validate()?;

    let db = Database::open()?;
    let app = AppStore::new();
    match current_profile(&db)? {
        Some(profile) => app.set_profile(Some(profile)),
        None => eprintln!("no profile set; this session will not be saved"),
    }

    let room = FocusRoom::new(
        FocusEngine::new(config.session.clone()),
        db,
        ConfiguredCoach::from_config(&config.coach),
        StderrNotifier,
        app,
    )
    .with_notifications(config.notifications.enabled);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(SessionDriver::new(room)));
    // stdin reads park a blocking thread that never returns on its own
    runtime.shutdown_background();
    result
}

async fn drive(driver: SessionDriver<Database, ConfiguredCoach, StderrNotifier>) -> CliResult {
    let (tx, rx) = mpsc::channel(16);
    let finished = Notify::new();
    let mut write_error: Option<serde_json::Error> = None;

    tx.send(DriverCommand::Start).await?;

    let input = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else { break };
                    let Some(command) = parse_command(&line) else {
                        if !line.trim().is_empty() {
                            eprintln!("unknown command: {}", line.trim());
                        }
                        continue;
                    };
                    if tx.send(command).await.is_err() || command == DriverCommand::Stop {
                        break;
                    }
                }
                _ = finished.notified() => break,
            }
        }
        drop(tx);
    };

    let on_output = |output: DriverOutput| {
        let line = match &output {
            DriverOutput::Event(event) => serde_json::to_string(event),
            DriverOutput::Outcome(outcome) => serde_json::to_string(outcome),
        };
        match line {
            Ok(line) => println!("{line}"),
            Err(e) => write_error = Some(e),
        }
        if let DriverOutput::Outcome(outcome) = &output {
            if let Some(insight) = &outcome.insight {
                eprintln!("\n{insight}\n");
            }
            finished.notify_one();
        }
    };

    tokio::join!(driver.run(rx, on_output), input);

    match write_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn parse_command(line: &str) -> Option<DriverCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "b" => Some(DriverCommand::Signal(AttentionSignal::FocusLost)),
        "f" => Some(DriverCommand::Signal(AttentionSignal::FocusGained)),
        "status" | "s" => Some(DriverCommand::Status),
        "stop" | "q" => Some(DriverCommand::Stop),
        other => other.parse().ok().map(DriverCommand::Signal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_accepts_short_and_long_forms() {
        assert_eq!(
            parse_command("b"),
            Some(DriverCommand::Signal(AttentionSignal::FocusLost))
        );
        assert_eq!(
            parse_command(" hidden "),
            Some(DriverCommand::Signal(AttentionSignal::Hidden))
        );
        assert_eq!(
            parse_command("FOCUS"),
            Some(DriverCommand::Signal(AttentionSignal::FocusGained))
        );
        assert_eq!(parse_command("s"), Some(DriverCommand::Status));
        assert_eq!(parse_command("q"), Some(DriverCommand::Stop));
        assert_eq!(parse_command("pause"), None);
    }
}
