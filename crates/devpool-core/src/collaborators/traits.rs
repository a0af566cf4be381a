use serde::{Deserialize, Serialize};

use crate::error::{CoachError, CoreError};
use crate::session::SessionSummary;
use crate::storage::Database;

/// Where completed sessions and folded profile scores are written.
///
/// Calls are made once per session, after the engine is already idle.
/// Failures are reported to the user and never retried.
pub trait SessionStore {
    fn record_session(&self, user_id: &str, summary: &SessionSummary) -> Result<(), CoreError>;

    fn update_focus_score(&self, user_id: &str, score: u8) -> Result<(), CoreError>;
}

/// Produces coaching text for a finished session.
#[allow(async_fn_in_trait)]
pub trait FocusCoach {
    async fn analyze(&self, summary: &SessionSummary) -> Result<String, CoachError>;
}

/// Receives user-visible notifications.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl SessionStore for Database {
    fn record_session(&self, user_id: &str, summary: &SessionSummary) -> Result<(), CoreError> {
        self.record_focus_session(user_id, summary)?;
        Ok(())
    }

    fn update_focus_score(&self, user_id: &str, score: u8) -> Result<(), CoreError> {
        self.set_focus_score(user_id, score)?;
        Ok(())
    }
}
