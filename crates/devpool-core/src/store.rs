//! Shared application state.
//!
//! A small container for the state several screens need: the signed-in
//! profile, the active project and the deep-work flag. Handles are cloned
//! and passed to whoever needs them. Writes are last-write-wins and no
//! change notifications are sent.

use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Founder,
    Learner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Founder => "founder",
            Role::Learner => "learner",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "founder" => Ok(Role::Founder),
            "learner" => Ok(Role::Learner),
            other => Err(format!("unknown role: {other} (expected founder or learner)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
    /// Running focus score, 0..=100.
    pub focus_score: u8,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            display_name: display_name.into(),
            role,
            focus_score: 0,
            skills: None,
            bio: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct AppState {
    profile: Option<UserProfile>,
    active_project_id: Option<String>,
    deep_work_mode: bool,
}

/// Cloneable handle to the process-wide application state.
#[derive(Debug, Clone, Default)]
pub struct AppStore {
    inner: Arc<RwLock<AppState>>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        let store = Self::new();
        store.set_profile(Some(profile));
        store
    }

    // Setters replace whole fields, so a poisoned lock still holds consistent state.
    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.read().profile.clone()
    }

    pub fn set_profile(&self, profile: Option<UserProfile>) {
        self.write().profile = profile;
    }

    /// Replace only the focus score of the current profile, if any.
    pub fn set_focus_score(&self, score: u8) -> bool {
        match self.write().profile.as_mut() {
            Some(profile) => {
                profile.focus_score = score.min(100);
                true
            }
            None => false,
        }
    }

    pub fn active_project_id(&self) -> Option<String> {
        self.read().active_project_id.clone()
    }

    pub fn set_active_project_id(&self, id: Option<String>) {
        self.write().active_project_id = id;
    }

    pub fn is_deep_work_mode(&self) -> bool {
        self.read().deep_work_mode
    }

    pub fn set_deep_work_mode(&self, on: bool) {
        self.write().deep_work_mode = on;
    }
}
