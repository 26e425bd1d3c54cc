//! Domain error types.
//!
//! The analysis pass itself never fails; these errors come from loading bars,
//! reading configuration and rendering annotations.

/// Top-level error type for structbreak.
#[derive(Debug, thiserror::Error)]
pub enum StructbreakError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("render error: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StructbreakError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            StructbreakError::Io(_) => 1,
            StructbreakError::ConfigParse { .. }
            | StructbreakError::ConfigMissing { .. }
            | StructbreakError::ConfigInvalid { .. } => 2,
            StructbreakError::Data { .. } => 3,
            StructbreakError::Render { .. } => 4,
        }
    }
}

impl From<&StructbreakError> for std::process::ExitCode {
    fn from(err: &StructbreakError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
