//! # DevPool Core Library
//!
//! This library provides the Focus Room of the DevPool marketplace: a timed
//! deep-work session that pauses itself when the user looks away and reports
//! a focus score when it ends. The CLI binary drives it from a terminal; any
//! other host only needs to forward ticks and window attention signals.
//!
//! ## Architecture
//!
//! - **Session Engine**: A tick-driven state machine with distraction
//!   detection and a bounded random-walk focus sampler
//! - **Focus Room**: The engine wired to persistence, AI coaching and
//!   notifications
//! - **Driver**: Async timer loop that owns the periodic interval
//! - **Storage**: SQLite session/profile storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: Core session state machine
//! - [`FocusRoom`]: Engine plus collaborators
//! - [`SessionDriver`]: Timer and command loop
//! - [`AppStore`]: Shared profile/project state
//! - [`Database`]: Session and profile persistence
//! - [`Config`]: Application configuration management

pub mod collaborators;
pub mod driver;
pub mod error;
pub mod events;
pub mod room;
pub mod session;
pub mod storage;
pub mod store;

pub use collaborators::{
    ConfiguredCoach, DisabledCoach, FocusCoach, HttpCoach, Notification, NotificationLevel,
    Notifier, SessionStore,
};
pub use driver::{DriverCommand, DriverOutput, SessionDriver};
pub use error::{CoachError, ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use room::{FocusRoom, SessionOutcome};
pub use session::{
    fold_focus_score, format_countdown, AttentionObserver, AttentionSignal, AveragePolicy,
    FocusEngine, SessionState, SessionSummary,
};
pub use storage::{Config, Database, FocusSessionRecord, FocusStats, SessionConfig};
pub use store::{AppStore, Role, UserProfile};
