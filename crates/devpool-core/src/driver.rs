//! Async driver for a focus room.
//!
//! Owns the periodic timer. The interval exists only while the engine is
//! `Running`: it is created on entering `Running` (first tick one full
//! period later) and dropped on leaving it, before any summary is computed.
//! Commands and ticks are handled one at a time, so every transition is
//! atomic with respect to the others.
//!
//! Missed ticks are skipped, not replayed. Duration is measured from the
//! engine's clock, so a suspended host only loses countdown progress.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::collaborators::{FocusCoach, Notifier, SessionStore};
use crate::events::Event;
use crate::room::{FocusRoom, SessionOutcome};
use crate::session::AttentionSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    Start,
    Stop,
    Signal(AttentionSignal),
    /// Emit a state snapshot.
    Status,
    /// Stop any active session and return.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutput {
    Event(Event),
    Outcome(SessionOutcome),
}

pub struct SessionDriver<S, C, N> {
    room: FocusRoom<S, C, N>,
    period: Duration,
}

impl<S, C, N> SessionDriver<S, C, N>
where
    S: SessionStore,
    C: FocusCoach,
    N: Notifier,
{
    pub fn new(room: FocusRoom<S, C, N>) -> Self {
        let period = Duration::from_millis(room.engine().config().tick_interval_ms.max(1));
        Self { room, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run until `Shutdown` or until every command sender is dropped.
    ///
    /// An active session is stopped and dispatched before returning.
    pub async fn run<F>(
        mut self,
        mut commands: mpsc::Receiver<DriverCommand>,
        mut on_output: F,
    ) -> FocusRoom<S, C, N>
    where
        F: FnMut(DriverOutput),
    {
        let mut ticker: Option<Interval> = None;

        loop {
            self.sync_ticker(&mut ticker);

            tokio::select! {
                _ = next_tick(&mut ticker) => {
                    let (events, outcome) = self.room.tick().await;
                    emit(events, &mut on_output);
                    if let Some(outcome) = outcome {
                        on_output(DriverOutput::Outcome(outcome));
                    }
                }
                command = commands.recv() => {
                    let command = command.unwrap_or(DriverCommand::Shutdown);
                    debug!(?command, "driver command");
                    match command {
                        DriverCommand::Start => emit(self.room.start(), &mut on_output),
                        DriverCommand::Signal(signal) => {
                            emit(self.room.signal(signal), &mut on_output);
                        }
                        DriverCommand::Status => {
                            on_output(DriverOutput::Event(self.room.engine().snapshot()));
                        }
                        DriverCommand::Stop => {
                            ticker = None;
                            self.finish(&mut on_output).await;
                        }
                        DriverCommand::Shutdown => {
                            ticker = None;
                            self.finish(&mut on_output).await;
                            break;
                        }
                    }
                }
            }
        }

        info!("focus driver stopped");
        self.room
    }

    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        let running = self.room.engine().is_running();
        match (running, ticker.is_some()) {
            (true, false) => {
                let mut interval = interval_at(Instant::now() + self.period, self.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                *ticker = Some(interval);
            }
            (false, true) => *ticker = None,
            _ => {}
        }
    }

    /// End any active session, then dispatch its summary.
    async fn finish<F>(&mut self, on_output: &mut F)
    where
        F: FnMut(DriverOutput),
    {
        let Some(event) = self.room.end() else {
            return;
        };
        let summary = match &event {
            Event::SessionEnded { summary, .. } => Some(summary.clone()),
            _ => None,
        };
        on_output(DriverOutput::Event(event));
        if let Some(summary) = summary {
            let outcome = self.room.complete(summary).await;
            on_output(DriverOutput::Outcome(outcome));
        }
    }
}

fn emit<F>(events: impl IntoIterator<Item = Event>, on_output: &mut F)
where
    F: FnMut(DriverOutput),
{
    for event in events {
        on_output(DriverOutput::Event(event));
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
