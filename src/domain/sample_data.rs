//! Synthetic daily bars for demonstrations.
//!
//! open ~ U(100, 150), high = open + U(0, 10), low = open - U(0, 10),
//! close ~ U(low, high). Deterministic for a given seed.

use crate::domain::bar::Bar;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2023, 7, 1).unwrap_or_default(),
            seed: 42,
        }
    }
}

/// One bar per calendar day, `start_date..=end_date`. Empty when the range is reversed.
pub fn generate_sample_bars(config: &SampleConfig) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let days = (config.end_date - config.start_date).num_days();
    if days < 0 {
        return Vec::new();
    }

    (0..=days)
        .map(|d| {
            let open = rng.gen_range(100.0..150.0);
            let high = open + rng.gen_range(0.0..10.0);
            let low = open - rng.gen_range(0.0..10.0);
            let close = rng.gen_range(low..=high);
            Bar {
                timestamp: (config.start_date + Duration::days(d)).and_time(Default::default()),
                open,
                high,
                low,
                close,
            }
        })
        .collect()
}
