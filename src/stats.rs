//! Min/max/avg reduction over per-query samples.
//!
//! Per-query measures carry plain `f64` sample slots; the corpus aggregator
//! collects those samples and reduces them here. Keeping the sample and the
//! reduced statistic as separate types means a per-query value can never be
//! mistaken for a corpus-level minimum.

use serde_json::{json, Value};

/// Summary statistics over a batch of numeric samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    /// Arithmetic mean; 0 for an empty batch.
    pub avg: f64,
    /// Smallest sample; 0 for an empty batch.
    pub min: f64,
    /// Largest sample; 0 for an empty batch.
    pub max: f64,
}

impl Stats {
    /// Reduce a batch of samples. An empty batch yields the all-zero default.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Stats::default();
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &sample in samples {
            min = min.min(sample);
            max = max.max(sample);
            sum += sample;
        }
        Stats {
            avg: sum / samples.len() as f64,
            min,
            max,
        }
    }

    /// Serialize as the report's `{"avg", "min", "max"}` object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({"avg": self.avg, "min": self.min, "max": self.max})
    }
}

/// Ratio with a zero-denominator guard: empty denominators score 0, never
/// NaN or a fault.
pub(crate) fn safe_ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}
