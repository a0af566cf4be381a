//! End-of-session summary and the derived metrics around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sampler::FocusSeries;

/// Which samples feed the end-of-session average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragePolicy {
    /// Every sample collected while running.
    #[default]
    AllSamples,
    /// Only the trailing samples shown on the live chart.
    DisplayWindow,
}

/// Result of one focus run, handed to the persistence and coaching collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Wall-clock seconds from start to stop. Independent of the countdown.
    pub duration_secs: u64,
    /// Rounded mean focus score, 0..=100.
    pub average_focus_score: u8,
    pub sample_count: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn duration_min(&self) -> u64 {
        self.duration_secs / 60
    }
}

/// `floor((end - start) / 1000)`, zero if the clock went backwards.
pub fn duration_secs(started_at_ms: u64, ended_at_ms: u64) -> u64 {
    ended_at_ms.saturating_sub(started_at_ms) / 1000
}

/// Rounded arithmetic mean, 0 for an empty slice.
pub fn average_score(samples: &[f64]) -> u8 {
    if samples.is_empty() {
        return 0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}

pub fn series_average(series: &FocusSeries, policy: AveragePolicy) -> u8 {
    match policy {
        AveragePolicy::AllSamples => average_score(series.all()),
        AveragePolicy::DisplayWindow => average_score(series.window()),
    }
}

/// Fold a session average into a running profile score.
///
/// `round(old * 0.7 + average * 0.3)`, evaluated in integers so that
/// halves always round up.
pub fn fold_focus_score(old_score: u8, session_average: u8) -> u8 {
    let old = u32::from(old_score.min(100));
    let avg = u32::from(session_average.min(100));
    ((old * 7 + avg * 3 + 5) / 10) as u8
}

/// `MM:SS`, both fields zero-padded.
pub fn format_countdown(remaining_secs: u32) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}
