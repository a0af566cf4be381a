//! The focus room: the session engine wired to its collaborators.
//!
//! The room forwards commands and attention signals to the
//! [`FocusEngine`], turns distraction edges into notifications, and when a
//! session ends hands the summary to the [`SessionStore`] and the
//! [`FocusCoach`]. The two hand-offs run concurrently and neither one's
//! failure affects the other.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborators::{FocusCoach, Notification, Notifier, SessionStore};
use crate::events::Event;
use crate::session::{fold_focus_score, AttentionObserver, AttentionSignal, FocusEngine, SessionSummary};
use crate::store::AppStore;

/// What happened to a summary after the session ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub summary: SessionSummary,
    /// The session record was written.
    pub saved: bool,
    /// Folded profile score, when it was written.
    pub focus_score: Option<u8>,
    /// Coaching text, absent when the coach failed or is off.
    pub insight: Option<String>,
}

pub struct FocusRoom<S, C, N> {
    engine: FocusEngine,
    store: S,
    coach: C,
    notifier: N,
    app: AppStore,
    notifications_enabled: bool,
    last_insight: Option<String>,
}

impl<S, C, N> FocusRoom<S, C, N>
where
    S: SessionStore,
    C: FocusCoach,
    N: Notifier,
{
    pub fn new(engine: FocusEngine, store: S, coach: C, notifier: N, app: AppStore) -> Self {
        Self {
            engine,
            store,
            coach,
            notifier,
            app,
            notifications_enabled: true,
            last_insight: None,
        }
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &FocusEngine {
        &self.engine
    }

    pub fn app(&self) -> &AppStore {
        &self.app
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Coaching text from the most recent session, if any.
    pub fn last_insight(&self) -> Option<&str> {
        self.last_insight.as_deref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start()?;
        self.app.set_deep_work_mode(true);
        self.notify_for(&event);
        Some(event)
    }

    pub fn signal(&mut self, signal: AttentionSignal) -> Option<Event> {
        let event = self.engine.observe(signal)?;
        self.notify_for(&event);
        Some(event)
    }

    /// Advance one period.
    ///
    /// When the tick ends the session (`auto_stop_at_zero`), the summary is
    /// dispatched before returning, exactly as [`stop`](Self::stop) does.
    pub async fn tick(&mut self) -> (Vec<Event>, Option<SessionOutcome>) {
        let events = self.engine.tick();
        let ended = events.iter().find_map(|event| match event {
            Event::SessionEnded { summary, .. } => Some(summary.clone()),
            _ => None,
        });
        let outcome = match ended {
            Some(summary) => {
                self.app.set_deep_work_mode(false);
                Some(self.complete(summary).await)
            }
            None => None,
        };
        (events, outcome)
    }

    /// End the run in the engine without dispatching the summary.
    ///
    /// The engine is idle when this returns; pass the summary from the
    /// returned event to [`complete`](Self::complete).
    pub fn end(&mut self) -> Option<Event> {
        let event = self.engine.stop()?;
        self.app.set_deep_work_mode(false);
        Some(event)
    }

    /// End the run and dispatch its summary. `None` when no session was active.
    pub async fn stop(&mut self) -> Option<SessionOutcome> {
        match self.end()? {
            Event::SessionEnded { summary, .. } => Some(self.complete(summary).await),
            _ => None,
        }
    }

    /// Hand a finished session to the store and the coach.
    pub async fn complete(&mut self, summary: SessionSummary) -> SessionOutcome {
        let (persisted, analysis) =
            tokio::join!(async { self.persist(&summary) }, self.coach.analyze(&summary));

        let insight = match analysis {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(error = %e, "no coaching insight for session");
                None
            }
        };
        self.last_insight = insight.clone();

        let (saved, focus_score) = persisted;
        SessionOutcome {
            summary,
            saved,
            focus_score,
            insight,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&self, summary: &SessionSummary) -> (bool, Option<u8>) {
        let Some(profile) = self.app.profile() else {
            warn!("no signed-in profile, focus session not saved");
            self.notify(Notification::error("Sign in to save focus sessions"));
            return (false, None);
        };

        if let Err(e) = self.store.record_session(&profile.user_id, summary) {
            warn!(error = %e, user_id = %profile.user_id, "failed to save focus session");
            self.notify(Notification::error("Failed to save session data"));
            return (false, None);
        }

        let score = fold_focus_score(profile.focus_score, summary.average_focus_score);
        let focus_score = match self.store.update_focus_score(&profile.user_id, score) {
            Ok(()) => {
                self.app.set_focus_score(score);
                info!(user_id = %profile.user_id, score, "focus score updated");
                Some(score)
            }
            Err(e) => {
                warn!(error = %e, user_id = %profile.user_id, "failed to update focus score");
                self.notify(Notification::error("Failed to update focus score"));
                None
            }
        };

        self.notify(
            Notification::success("Focus Session Saved").with_description(format!(
                "Duration: {}m, Avg Focus: {}%",
                summary.duration_min(),
                summary.average_focus_score
            )),
        );
        (true, focus_score)
    }

    fn notify_for(&self, event: &Event) {
        if let Some(notification) = event.notification() {
            self.notify(notification);
        }
    }

    fn notify(&self, notification: Notification) {
        if self.notifications_enabled {
            self.notifier.notify(&notification);
        }
    }
}
