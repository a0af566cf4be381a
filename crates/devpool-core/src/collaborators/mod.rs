//! Collaborators the focus room hands its results to.
//!
//! - [`SessionStore`]: persists sessions and the folded profile score
//! - [`FocusCoach`]: turns a summary into coaching text
//! - [`Notifier`]: shows user-visible notifications

mod coach;
mod traits;

pub use coach::{ConfiguredCoach, DisabledCoach, HttpCoach, API_KEY_ENTRY};
pub use traits::{
    FocusCoach, Notification, NotificationLevel, Notifier, SessionStore,
};

/// OS keyring access for collaborator credentials.
pub mod keyring_store {
    use crate::error::CoachError;

    const SERVICE: &str = "devpool";

    pub fn get(key: &str) -> Result<Option<String>, CoachError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), CoachError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), CoachError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
