//! Focus level random walk and the sample series it feeds.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

pub const MIN_FOCUS: f64 = 0.0;
pub const MAX_FOCUS: f64 = 100.0;

/// Bounded random walk over the focus level.
///
/// Each step moves the level by a uniform amount in `[-max_step, max_step)`
/// and clamps the result to `[0, 100]`.
#[derive(Debug, Clone)]
pub struct FocusSampler {
    rng: Mcg128Xsl64,
    max_step: f64,
}

impl FocusSampler {
    /// A sampler seeded for reproducible runs, or from entropy when `seed` is `None`.
    ///
    /// `max_step` is clamped to `[0, 100]`; NaN means no movement.
    pub fn new(max_step: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            rng,
            max_step: clamp_focus(max_step.abs()),
        }
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Next level after `current`.
    pub fn next(&mut self, current: f64) -> f64 {
        let delta = if self.max_step > 0.0 {
            self.rng.gen_range(-self.max_step..self.max_step)
        } else {
            0.0
        };
        clamp_focus(current + delta)
    }
}

pub fn clamp_focus(level: f64) -> f64 {
    if level.is_nan() {
        return MIN_FOCUS;
    }
    level.clamp(MIN_FOCUS, MAX_FOCUS)
}

/// Every sample collected during one run.
///
/// The live chart only shows the trailing `display_window` entries; the
/// full list stays available for averaging.
#[derive(Debug, Clone)]
pub struct FocusSeries {
    samples: Vec<f64>,
    display_window: usize,
}

impl FocusSeries {
    pub fn new(display_window: usize) -> Self {
        Self {
            samples: Vec::new(),
            display_window,
        }
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push(clamp_focus(sample));
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn all(&self) -> &[f64] {
        &self.samples
    }

    /// Trailing samples for display, oldest first.
    pub fn window(&self) -> &[f64] {
        let start = self.samples.len().saturating_sub(self.display_window);
        &self.samples[start..]
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.last().copied()
    }
}
