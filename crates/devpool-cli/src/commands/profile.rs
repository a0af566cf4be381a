//! Local profile commands.
//!
//! The profile set here is the one focus sessions are recorded under and
//! whose focus score is folded after each session.

use clap::Subcommand;
use devpool_core::storage::Database;
use devpool_core::{Role, UserProfile};

use super::{require_profile, CliResult, CURRENT_USER_KEY};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the current profile as JSON
    Show,

    /// Create or update the current profile
    Set {
        /// Stable user id sessions are recorded under
        #[arg(long)]
        user_id: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// "founder" or "learner"
        #[arg(long, default_value = "learner")]
        role: Role,
    },

    /// Reset the current profile's focus score to 0
    ResetScore,
}

pub fn run(action: ProfileAction) -> CliResult {
    let db = Database::open()?;
    match action {
        ProfileAction::Show => {
            let profile = require_profile(&db)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfileAction::Set { user_id, name, role } => {
            let profile = match db.get_profile(&user_id)? {
                Some(mut existing) => {
                    existing.display_name = name;
                    existing.role = role;
                    existing
                }
                None => UserProfile::new(user_id, name, role),
            };
            db.upsert_profile(&profile)?;
            db.kv_set(CURRENT_USER_KEY, &profile.user_id)?;
            println!("Profile saved: {} ({})", profile.display_name, profile.role.as_str());
        }
        ProfileAction::ResetScore => {
            let profile = require_profile(&db)?;
            db.set_focus_score(&profile.user_id, 0)?;
            println!("focus score reset");
        }
    }
    Ok(())
}
