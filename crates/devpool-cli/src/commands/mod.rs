pub mod coach;
pub mod config;
pub mod focus;
pub mod profile;

use devpool_core::storage::Database;
use devpool_core::UserProfile;

/// kv key holding the user id that CLI sessions are recorded under.
pub const CURRENT_USER_KEY: &str = "current_user";

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn current_profile(db: &Database) -> Result<Option<UserProfile>, Box<dyn std::error::Error>> {
    match db.kv_get(CURRENT_USER_KEY)? {
        Some(user_id) => Ok(db.get_profile(&user_id)?),
        None => Ok(None),
    }
}

pub fn require_profile(db: &Database) -> Result<UserProfile, Box<dyn std::error::Error>> {
    current_profile(db)?.ok_or_else(|| "no profile; run `devpool-cli profile set` first".into())
}
