//! Configuration validation.
//!
//! Validates all config fields before an analysis runs.

use crate::domain::error::StructbreakError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), StructbreakError> {
    validate_range(config)?;
    validate_colors(config)?;
    validate_output(config)?;
    Ok(())
}

/// Keys a standalone config file must set; analysis runs fall back to defaults instead.
pub fn validate_required_keys(config: &dyn ConfigPort) -> Result<(), StructbreakError> {
    const REQUIRED: [(&str, &str); 1] = [("analysis", "range")];
    for (section, key) in REQUIRED {
        if config.get_string(section, key).is_none() {
            return Err(StructbreakError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_sample_config(config: &dyn ConfigPort) -> Result<(), StructbreakError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(StructbreakError::ConfigInvalid {
                section: "sample".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }

    if let Some(seed) = config.get_string("sample", "seed") {
        if seed.trim().parse::<u64>().is_err() {
            return Err(StructbreakError::ConfigInvalid {
                section: "sample".to_string(),
                key: "seed".to_string(),
                reason: "seed must be a non-negative integer".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_range(config: &dyn ConfigPort) -> Result<(), StructbreakError> {
    let Some(raw) = config.get_string("analysis", "range") else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 1 => Ok(()),
        Ok(_) => Err(StructbreakError::ConfigInvalid {
            section: "analysis".to_string(),
            key: "range".to_string(),
            reason: "range must be at least 1".to_string(),
        }),
        Err(_) => Err(StructbreakError::ConfigInvalid {
            section: "analysis".to_string(),
            key: "range".to_string(),
            reason: "range must be an integer".to_string(),
        }),
    }
}

fn validate_colors(config: &dyn ConfigPort) -> Result<(), StructbreakError> {
    for key in [
        "bearish_color",
        "bullish_color",
        "bearish_line_color",
        "bullish_line_color",
    ] {
        if let Some(value) = config.get_string("analysis", key) {
            if value.trim().is_empty() {
                return Err(StructbreakError::ConfigInvalid {
                    section: "analysis".to_string(),
                    key: key.to_string(),
                    reason: format!("{} must not be empty", key),
                });
            }
        }
    }
    Ok(())
}

fn validate_output(config: &dyn ConfigPort) -> Result<(), StructbreakError> {
    for key in ["width", "height"] {
        let value = config.get_int("output", key, 1);
        if value < 1 || value > i64::from(u32::MAX) {
            return Err(StructbreakError::ConfigInvalid {
                section: "output".to_string(),
                key: key.to_string(),
                reason: format!("{} must be between 1 and {}", key, u32::MAX),
            });
        }
    }
    Ok(())
}

fn parse_optional_date(
    config: &dyn ConfigPort,
    field: &str,
) -> Result<Option<NaiveDate>, StructbreakError> {
    match config.get_string("sample", field) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| StructbreakError::ConfigInvalid {
                section: "sample".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }),
    }
}
