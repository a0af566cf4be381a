mod attention;
mod clock;
mod engine;
mod sampler;
mod summary;

pub use attention::{AttentionObserver, AttentionSignal};
pub use clock::{to_datetime, Clock, ManualClock, SystemClock, TokioClock};
pub use engine::{FocusEngine, SessionState};
pub use sampler::{clamp_focus, FocusSampler, FocusSeries, MAX_FOCUS, MIN_FOCUS};
pub use summary::{
    average_score, duration_secs, fold_focus_score, format_countdown, series_average,
    AveragePolicy, SessionSummary,
};
