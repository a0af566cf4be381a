//! AI coach -- turns a session summary into a short piece of advice.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use super::keyring_store;
use super::traits::FocusCoach;
use crate::error::CoachError;
use crate::session::SessionSummary;
use crate::storage::CoachConfig;

/// Keyring entry holding the text generation API key.
pub const API_KEY_ENTRY: &str = "ai_api_key";

/// Posts `{system, prompt}` to a text generation endpoint and reads `{text}` back.
#[derive(Debug, Clone)]
pub struct HttpCoach {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateTextResponse {
    #[serde(default)]
    text: String,
}

impl HttpCoach {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, CoachError> {
        let endpoint = Url::parse(endpoint).map_err(|source| CoachError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Build from config. The API key comes from `api_key_env`, then the OS keyring.
    pub fn from_config(config: &CoachConfig) -> Result<Self, CoachError> {
        if !config.enabled {
            return Err(CoachError::Disabled);
        }
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(CoachError::MissingEndpoint)?;
        Url::parse(endpoint).map_err(|source| CoachError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| match keyring_store::get(API_KEY_ENTRY) {
                Ok(key) => key,
                Err(e) => {
                    debug!(error = %e, "no AI key in keyring");
                    None
                }
            });
        Self::new(endpoint, api_key, Duration::from_secs(config.timeout_secs))
    }
}

impl FocusCoach for HttpCoach {
    async fn analyze(&self, summary: &SessionSummary) -> Result<String, CoachError> {
        let body = json!({
            "system": system_prompt(summary),
            "prompt": "Analyze my focus session.",
        });

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            warn!(status, "AI coach request rejected");
            return Err(CoachError::Status { status });
        }

        let parsed: GenerateTextResponse = resp.json().await?;
        let text = parsed.text.trim();
        if text.is_empty() {
            return Err(CoachError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Always declines. Used when coaching is off or misconfigured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCoach;

impl FocusCoach for DisabledCoach {
    async fn analyze(&self, _summary: &SessionSummary) -> Result<String, CoachError> {
        Err(CoachError::Disabled)
    }
}

/// The coach selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredCoach {
    Http(HttpCoach),
    Disabled(DisabledCoach),
}

impl ConfiguredCoach {
    pub fn from_config(config: &CoachConfig) -> Self {
        match HttpCoach::from_config(config) {
            Ok(coach) => ConfiguredCoach::Http(coach),
            Err(CoachError::Disabled) => ConfiguredCoach::Disabled(DisabledCoach),
            Err(e) => {
                warn!(error = %e, "AI coach unavailable");
                ConfiguredCoach::Disabled(DisabledCoach)
            }
        }
    }
}

impl FocusCoach for ConfiguredCoach {
    async fn analyze(&self, summary: &SessionSummary) -> Result<String, CoachError> {
        match self {
            ConfiguredCoach::Http(coach) => coach.analyze(summary).await,
            ConfiguredCoach::Disabled(coach) => coach.analyze(summary).await,
        }
    }
}

fn system_prompt(summary: &SessionSummary) -> String {
    indoc::formatdoc! {"
        You are an AI performance coach for DevPool, a collaborative startup ecosystem for learners.
        Summarize the user's focus session in two or three encouraging sentences and give one
        actionable tip for the next session.
        - Duration: {minutes} minutes
        - Focus score: {score}%
        ",
        minutes = summary.duration_min(),
        score = summary.average_focus_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary() -> SessionSummary {
        let now = Utc::now();
        SessionSummary {
            duration_secs: 1_530,
            average_focus_score: 82,
            sample_count: 1_500,
            started_at: now,
            ended_at: now,
        }
    }

    #[test]
    fn prompt_carries_duration_and_score() {
        let prompt = system_prompt(&summary());
        assert!(prompt.contains("Duration: 25 minutes"));
        assert!(prompt.contains("Focus score: 82%"));
    }

    #[test]
    fn disabled_config_is_rejected() {
        let err = HttpCoach::from_config(&CoachConfig::default()).unwrap_err();
        assert!(matches!(err, CoachError::Disabled));
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let config = CoachConfig {
            enabled: true,
            ..CoachConfig::default()
        };
        assert!(matches!(
            HttpCoach::from_config(&config),
            Err(CoachError::MissingEndpoint)
        ));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = HttpCoach::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CoachError::InvalidEndpoint { .. }));
    }

    #[test]
    fn misconfigured_coach_falls_back_to_disabled() {
        let config = CoachConfig {
            enabled: true,
            endpoint: Some("::nope::".into()),
            ..CoachConfig::default()
        };
        assert!(matches!(
            ConfiguredCoach::from_config(&config),
            ConfiguredCoach::Disabled(_)
        ));
    }

    #[tokio::test]
    async fn posts_summary_and_reads_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generate")
            .match_header("authorization", "Bearer secret")
            .match_body(mockito::Matcher::PartialJson(json!({
                "prompt": "Analyze my focus session."
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "  Great session. Keep it up!  "}"#)
            .create_async()
            .await;

        let coach = HttpCoach::new(
            &format!("{}/generate", server.url()),
            Some("secret".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        let text = coach.analyze(&summary()).await.unwrap();
        assert_eq!(text, "Great session. Keep it up!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/generate")
            .with_status(503)
            .create_async()
            .await;

        let coach = HttpCoach::new(
            &format!("{}/generate", server.url()),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(matches!(
            coach.analyze(&summary()).await,
            Err(CoachError::Status { status: 503 })
        ));
    }

    #[tokio::test]
    async fn empty_text_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "   "}"#)
            .create_async()
            .await;

        let coach = HttpCoach::new(
            &format!("{}/generate", server.url()),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(matches!(
            coach.analyze(&summary()).await,
            Err(CoachError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn disabled_coach_declines() {
        assert!(matches!(
            DisabledCoach.analyze(&summary()).await,
            Err(CoachError::Disabled)
        ));
    }
}
