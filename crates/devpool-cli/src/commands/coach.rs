use clap::Subcommand;
use devpool_core::collaborators::{keyring_store, API_KEY_ENTRY};
use devpool_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum CoachAction {
    /// Store the coach API key in the OS keyring
    Login {
        /// API key for the text-generation endpoint
        #[arg(long)]
        key: String,
    },
    /// Remove the stored API key
    Logout,
    /// Show whether the coach is configured
    Status,
}

pub fn run(action: CoachAction) -> CliResult {
    match action {
        CoachAction::Login { key } => {
            keyring_store::set(API_KEY_ENTRY, &key)?;
            println!("coach API key saved");
        }
        CoachAction::Logout => {
            keyring_store::delete(API_KEY_ENTRY)?;
            println!("coach API key removed");
        }
        CoachAction::Status => {
            let config = Config::load()?;
            let from_env = std::env::var(&config.coach.api_key_env).is_ok();
            let key = if from_env {
                "env"
            } else if keyring_store::get(API_KEY_ENTRY)?.is_some() {
                "keyring"
            } else {
                "none"
            };
            let status = serde_json::json!({
                "enabled": config.coach.enabled,
                "endpoint": config.coach.endpoint,
                "api_key": key,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
