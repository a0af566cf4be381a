//! Attention signals from the host window.
//!
//! The engine does not know about windows or documents. Whatever hosts it
//! translates its own focus/visibility notifications into [`AttentionSignal`]s
//! and feeds them through [`AttentionObserver`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionSignal {
    FocusLost,
    FocusGained,
    Hidden,
    Visible,
}

impl AttentionSignal {
    /// `FocusLost` and `Hidden` are the same trigger.
    pub fn is_lost(self) -> bool {
        matches!(self, AttentionSignal::FocusLost | AttentionSignal::Hidden)
    }
}

impl FromStr for AttentionSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blur" | "focus_lost" | "lost" => Ok(AttentionSignal::FocusLost),
            "focus" | "focus_gained" | "gained" => Ok(AttentionSignal::FocusGained),
            "hidden" | "hide" => Ok(AttentionSignal::Hidden),
            "visible" | "show" => Ok(AttentionSignal::Visible),
            other => Err(format!("unknown attention signal: {other}")),
        }
    }
}

/// Receives attention edges. Implementors decide whether a signal is a
/// transition or a no-op and return the resulting event, if any.
pub trait AttentionObserver {
    fn on_lost(&mut self) -> Option<Event>;
    fn on_regained(&mut self) -> Option<Event>;

    fn observe(&mut self, signal: AttentionSignal) -> Option<Event> {
        if signal.is_lost() {
            self.on_lost()
        } else {
            self.on_regained()
        }
    }
}
