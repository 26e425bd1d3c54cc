//! Synthetic bar source.

use crate::domain::bar::Bar;
use crate::domain::error::StructbreakError;
use crate::domain::sample_data::{generate_sample_bars, SampleConfig};
use crate::ports::data_port::DataPort;

pub struct SampleAdapter {
    config: SampleConfig,
}

impl SampleAdapter {
    pub fn new(config: SampleConfig) -> Self {
        Self { config }
    }
}

impl DataPort for SampleAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, StructbreakError> {
        Ok(generate_sample_bars(&self.config))
    }

    fn describe(&self) -> String {
        format!(
            "sample data {} to {} (seed {})",
            self.config.start_date, self.config.end_date, self.config.seed
        )
    }
}
