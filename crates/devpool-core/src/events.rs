use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collaborators::Notification;
use crate::session::{SessionState, SessionSummary};

/// Every state change in the engine produces an Event.
/// The host renders them; collaborators are driven from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        duration_secs: u32,
        focus_level: f64,
        at: DateTime<Utc>,
    },
    Ticked {
        remaining_secs: u32,
        focus_level: f64,
        at: DateTime<Utc>,
    },
    /// Running -> Distracted.
    Distracted {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Distracted -> Running.
    FocusRestored {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero. Emitted once per run.
    CountdownElapsed {
        at: DateTime<Utc>,
    },
    SessionEnded {
        summary: SessionSummary,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        remaining_secs: u32,
        display: String,
        focus_level: f64,
        samples: Vec<f64>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// User-visible notification for this event, if it warrants one.
    ///
    /// Only the two distraction edges and the start of a session notify;
    /// ticks never do.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Event::SessionStarted { .. } => Some(Notification::success("Focus Session Started")),
            Event::Distracted { .. } => Some(Notification::warning(
                "Distraction Detected! Focus paused.",
            )),
            Event::FocusRestored { .. } => Some(Notification::success("Focus Restored")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NotificationLevel;

    #[test]
    fn ticks_do_not_notify() {
        let ev = Event::Ticked {
            remaining_secs: 10,
            focus_level: 80.0,
            at: Utc::now(),
        };
        assert!(ev.notification().is_none());
    }

    #[test]
    fn distraction_edges_notify() {
        let lost = Event::Distracted {
            remaining_secs: 10,
            at: Utc::now(),
        };
        let back = Event::FocusRestored {
            remaining_secs: 10,
            at: Utc::now(),
        };
        assert_eq!(
            lost.notification().map(|n| n.level),
            Some(NotificationLevel::Warning)
        );
        assert_eq!(
            back.notification().map(|n| n.level),
            Some(NotificationLevel::Success)
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let ev = Event::CountdownElapsed { at: Utc::now() };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "CountdownElapsed");
    }
}
