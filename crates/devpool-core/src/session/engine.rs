//! Focus session engine.
//!
//! A tick-driven state machine. It owns no timers: the host (see
//! [`SessionDriver`](crate::driver::SessionDriver)) calls `tick()` once per period
//! while the engine reports `is_running()`, and forwards attention signals
//! as they arrive.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Distracted -> Ended -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FocusEngine::new(SessionConfig::default());
//! engine.start();
//! // Once per second:
//! engine.tick();
//! // From the window:
//! engine.observe(AttentionSignal::Hidden);
//! // Later:
//! let ended = engine.stop(); // Some(Event::SessionEnded { .. })
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::attention::AttentionObserver;
use super::clock::{to_datetime, Clock, SystemClock};
use super::sampler::{clamp_focus, FocusSampler, FocusSeries};
use super::summary::{duration_secs, format_countdown, series_average, SessionSummary};
use crate::events::Event;
use crate::storage::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Distracted,
    /// Transient: held only while the summary is computed during `stop()`.
    Ended,
}

/// Core focus session engine.
///
/// Exclusively owns the session for one run. Every command is a no-op
/// returning `None` (or an empty list) when it is not valid in the current
/// state.
#[derive(Debug)]
pub struct FocusEngine {
    config: SessionConfig,
    state: SessionState,
    remaining_secs: u32,
    /// Epoch ms of the `Idle -> Running` transition for this run.
    started_at_ms: Option<u64>,
    series: FocusSeries,
    focus_level: f64,
    sampler: FocusSampler,
    countdown_elapsed: bool,
    clock: Arc<dyn Clock>,
}

impl FocusEngine {
    /// Create an engine on the system clock. Starts `Idle`.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let sampler = FocusSampler::new(config.max_step, config.seed);
        let series = FocusSeries::new(config.display_window);
        Self {
            remaining_secs: config.duration_secs,
            focus_level: clamp_focus(config.initial_focus_level),
            state: SessionState::Idle,
            started_at_ms: None,
            series,
            sampler,
            countdown_elapsed: false,
            clock,
            config,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Running or Distracted.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running | SessionState::Distracted)
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_distracted(&self) -> bool {
        self.state == SessionState::Distracted
    }

    pub fn focus_level(&self) -> f64 {
        self.focus_level
    }

    pub fn samples(&self) -> &FocusSeries {
        &self.series
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    /// `MM:SS` of the remaining countdown.
    pub fn countdown_display(&self) -> String {
        format_countdown(self.remaining_secs)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            remaining_secs: self.remaining_secs,
            display: self.countdown_display(),
            focus_level: self.focus_level,
            samples: self.series.window().to_vec(),
            at: to_datetime(self.clock.now_ms()),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// `Idle -> Running`. Ignored in any other state.
    pub fn start(&mut self) -> Option<Event> {
        if self.state != SessionState::Idle {
            return None;
        }
        let now = self.clock.now_ms();
        self.enter_idle();
        self.state = SessionState::Running;
        self.started_at_ms = Some(now);
        self.focus_level = clamp_focus(self.config.initial_focus_level);
        self.series.push(self.focus_level);
        info!(duration_secs = self.remaining_secs, "focus session started");
        Some(Event::SessionStarted {
            duration_secs: self.remaining_secs,
            focus_level: self.focus_level,
            at: to_datetime(now),
        })
    }

    /// Advance one period: countdown and sample, both at the same instant.
    ///
    /// Does nothing unless `Running`. May also report the countdown reaching
    /// zero and, with `auto_stop_at_zero`, the end of the session.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != SessionState::Running {
            return Vec::new();
        }
        let now = self.clock.now_ms();

        self.remaining_secs = self.remaining_secs.saturating_sub(1);

        let next = self.sampler.next(self.focus_level);
        self.focus_level = next;
        self.series.push(next);

        debug!(
            remaining_secs = self.remaining_secs,
            focus_level = next,
            "tick"
        );
        let mut events = vec![Event::Ticked {
            remaining_secs: self.remaining_secs,
            focus_level: next,
            at: to_datetime(now),
        }];

        if self.remaining_secs == 0 && !self.countdown_elapsed {
            self.countdown_elapsed = true;
            events.push(Event::CountdownElapsed {
                at: to_datetime(now),
            });
            if self.config.auto_stop_at_zero {
                events.extend(self.end_at(now));
            }
        }
        events
    }

    /// `Running | Distracted -> Ended -> Idle`. Ignored when `Idle`.
    ///
    /// Returns `Event::SessionEnded` carrying the summary.
    pub fn stop(&mut self) -> Option<Event> {
        if !self.is_active() {
            return None;
        }
        let now = self.clock.now_ms();
        self.end_at(now)
    }

    /// Abandon any run without producing a summary.
    pub fn reset(&mut self) {
        self.enter_idle();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn end_at(&mut self, now: u64) -> Option<Event> {
        let started = self.started_at_ms?;
        self.state = SessionState::Ended;

        let summary = SessionSummary {
            duration_secs: duration_secs(started, now),
            average_focus_score: series_average(&self.series, self.config.average_over),
            sample_count: self.series.len(),
            started_at: to_datetime(started),
            ended_at: to_datetime(now),
        };
        info!(
            duration_secs = summary.duration_secs,
            average_focus_score = summary.average_focus_score,
            samples = summary.sample_count,
            "focus session ended"
        );

        self.enter_idle();
        Some(Event::SessionEnded {
            summary,
            at: to_datetime(now),
        })
    }

    fn enter_idle(&mut self) {
        self.state = SessionState::Idle;
        self.remaining_secs = self.config.duration_secs;
        self.started_at_ms = None;
        self.countdown_elapsed = false;
        self.series.clear();
    }
}

impl AttentionObserver for FocusEngine {
    /// `Running -> Distracted`. Repeated losses are no-ops.
    fn on_lost(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        self.state = SessionState::Distracted;
        info!(remaining_secs = self.remaining_secs, "distraction detected");
        Some(Event::Distracted {
            remaining_secs: self.remaining_secs,
            at: to_datetime(self.clock.now_ms()),
        })
    }

    /// `Distracted -> Running`. Ignored unless distracted.
    fn on_regained(&mut self) -> Option<Event> {
        if self.state != SessionState::Distracted {
            return None;
        }
        self.state = SessionState::Running;
        info!(remaining_secs = self.remaining_secs, "focus restored");
        Some(Event::FocusRestored {
            remaining_secs: self.remaining_secs,
            at: to_datetime(self.clock.now_ms()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AttentionSignal, AveragePolicy, ManualClock};

    fn engine_with(config: SessionConfig) -> (FocusEngine, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let engine = FocusEngine::with_clock(config, Arc::new(clock.clone()));
        (engine, clock)
    }

    fn seeded() -> SessionConfig {
        SessionConfig {
            seed: Some(42),
            ..SessionConfig::default()
        }
    }

    fn run_secs(engine: &mut FocusEngine, clock: &ManualClock, secs: u32) {
        for _ in 0..secs {
            clock.advance_secs(1);
            engine.tick();
        }
    }

    #[test]
    fn starts_idle_with_full_countdown() {
        let (engine, _) = engine_with(seeded());
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.countdown_display(), "25:00");
        assert!(engine.samples().is_empty());
    }

    #[test]
    fn tick_while_idle_is_inert() {
        let (mut engine, clock) = engine_with(seeded());
        for _ in 0..5 {
            clock.advance_secs(1);
            assert!(engine.tick().is_empty());
            assert_eq!(engine.remaining_secs(), 1500);
        }
        assert!(engine.samples().is_empty());

        engine.start();
        run_secs(&mut engine, &clock, 3);
        assert!(engine.stop().is_some());
        for _ in 0..5 {
            clock.advance_secs(1);
            assert!(engine.tick().is_empty());
            assert_eq!(engine.remaining_secs(), 1500);
            assert_eq!(engine.state(), SessionState::Idle);
        }
        assert!(engine.samples().is_empty());
    }

    #[test]
    fn start_seeds_one_sample_and_records_start() {
        let (mut engine, clock) = engine_with(seeded());
        let ev = engine.start();
        assert!(matches!(ev, Some(Event::SessionStarted { duration_secs: 1500, .. })));
        assert_eq!(engine.state(), SessionState::Running);
        assert_eq!(engine.samples().all(), &[85.0]);
        assert_eq!(engine.started_at_ms(), Some(clock.now_ms()));
    }

    #[test]
    fn start_while_active_is_ignored() {
        let (mut engine, clock) = engine_with(seeded());
        engine.start();
        let first_start = engine.started_at_ms();
        clock.advance_secs(2);
        assert!(engine.start().is_none());
        engine.on_lost();
        assert!(engine.start().is_none());
        assert_eq!(engine.started_at_ms(), first_start);
    }

    #[test]
    fn five_focused_ticks() {
        let (mut engine, clock) = engine_with(seeded());
        engine.start();
        run_secs(&mut engine, &clock, 5);
        assert_eq!(engine.remaining_secs(), 1495);
        assert_eq!(engine.samples().len(), 6);
        assert_eq!(engine.countdown_display(), "24:55");
    }

    #[test]
    fn distraction_freezes_countdown_and_sampler() {
        let (mut engine, clock) = engine_with(seeded());
        engine.start();
        assert!(matches!(engine.on_lost(), Some(Event::Distracted { .. })));
        assert!(engine.is_distracted());
        for _ in 0..10 {
            clock.advance_secs(1);
            assert!(engine.tick().is_empty());
        }
        assert!(matches!(engine.on_regained(), Some(Event::FocusRestored { .. })));
        assert!(!engine.is_distracted());
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.samples().len(), 1);
    }

    #[test]
    fn repeated_signals_only_fire_on_edges() {
        let (mut engine, _) = engine_with(seeded());
        engine.start();
        assert!(engine.observe(AttentionSignal::FocusLost).is_some());
        assert!(engine.observe(AttentionSignal::Hidden).is_none());
        assert!(engine.observe(AttentionSignal::Visible).is_some());
        assert!(engine.observe(AttentionSignal::FocusGained).is_none());
    }

    #[test]
    fn signals_while_idle_are_ignored() {
        let (mut engine, _) = engine_with(seeded());
        assert!(engine.on_lost().is_none());
        assert!(engine.on_regained().is_none());
        assert_eq!(engine.state(), SessionState::Idle);
    }

    #[test]
    fn stop_uses_wall_clock_duration() {
        let (mut engine, clock) = engine_with(seeded());
        engine.start();
        run_secs(&mut engine, &clock, 3);
        match engine.stop() {
            Some(Event::SessionEnded { summary, .. }) => {
                assert_eq!(summary.duration_secs, 3);
                assert_eq!(summary.sample_count, 4);
                assert!(summary.average_focus_score <= 100);
            }
            other => panic!("expected SessionEnded, got {other:?}"),
        }
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(engine.samples().is_empty());
    }

    #[test]
    fn duration_includes_distracted_time() {
        let (mut engine, clock) = engine_with(seeded());
        engine.start();
        run_secs(&mut engine, &clock, 2);
        engine.on_lost();
        clock.advance_secs(30);
        engine.on_regained();
        run_secs(&mut engine, &clock, 1);
        match engine.stop() {
            Some(Event::SessionEnded { summary, .. }) => assert_eq!(summary.duration_secs, 33),
            other => panic!("expected SessionEnded, got {other:?}"),
        }
    }

    #[test]
    fn stop_while_distracted_ends_session() {
        let (mut engine, clock) = engine_with(seeded());
        engine.start();
        engine.on_lost();
        clock.advance_ms(1_999);
        match engine.stop() {
            Some(Event::SessionEnded { summary, .. }) => {
                assert_eq!(summary.duration_secs, 1);
                assert_eq!(summary.average_focus_score, 85);
            }
            other => panic!("expected SessionEnded, got {other:?}"),
        }
    }

    #[test]
    fn stop_while_idle_is_ignored() {
        let (mut engine, _) = engine_with(seeded());
        assert!(engine.stop().is_none());
        assert_eq!(engine.state(), SessionState::Idle);
    }

    #[test]
    fn countdown_floors_at_zero_and_keeps_running() {
        let (mut engine, clock) = engine_with(SessionConfig {
            duration_secs: 2,
            ..seeded()
        });
        engine.start();
        clock.advance_secs(1);
        assert_eq!(engine.tick().len(), 1);
        clock.advance_secs(1);
        let events = engine.tick();
        assert!(matches!(events.last(), Some(Event::CountdownElapsed { .. })));
        clock.advance_secs(1);
        assert_eq!(engine.tick().len(), 1);
        assert_eq!(engine.remaining_secs(), 0);
        assert!(engine.is_running());
    }

    #[test]
    fn auto_stop_ends_session_at_zero() {
        let (mut engine, clock) = engine_with(SessionConfig {
            duration_secs: 2,
            auto_stop_at_zero: true,
            ..seeded()
        });
        engine.start();
        run_secs(&mut engine, &clock, 1);
        clock.advance_secs(1);
        let events = engine.tick();
        assert!(matches!(events.last(), Some(Event::SessionEnded { .. })));
        assert_eq!(engine.state(), SessionState::Idle);
    }

    #[test]
    fn average_covers_samples_beyond_display_window() {
        let (mut engine, clock) = engine_with(SessionConfig {
            display_window: 3,
            average_over: AveragePolicy::AllSamples,
            max_step: 0.0,
            initial_focus_level: 60.0,
            ..seeded()
        });
        engine.start();
        run_secs(&mut engine, &clock, 9);
        assert_eq!(engine.samples().len(), 10);
        assert_eq!(engine.samples().window().len(), 3);
        match engine.stop() {
            Some(Event::SessionEnded { summary, .. }) => {
                assert_eq!(summary.sample_count, 10);
                assert_eq!(summary.average_focus_score, 60);
            }
            other => panic!("expected SessionEnded, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_reports_display_window() {
        let (mut engine, clock) = engine_with(SessionConfig {
            display_window: 2,
            ..seeded()
        });
        engine.start();
        run_secs(&mut engine, &clock, 4);
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                remaining_secs,
                display,
                samples,
                ..
            } => {
                assert_eq!(state, SessionState::Running);
                assert_eq!(remaining_secs, 1496);
                assert_eq!(display, "24:56");
                assert_eq!(samples.len(), 2);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn restart_reseeds_focus_level() {
        let (mut engine, clock) = engine_with(seeded());
        engine.start();
        run_secs(&mut engine, &clock, 20);
        engine.stop();
        engine.start();
        assert_eq!(engine.focus_level(), 85.0);
        assert_eq!(engine.samples().all(), &[85.0]);
    }
}
