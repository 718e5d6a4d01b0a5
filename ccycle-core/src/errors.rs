use thiserror::Error;

/// Errors raised while building a scenario.
///
/// Every variant is a setup-time failure: once a [`Scenario`](crate::scenario::Scenario)
/// has been constructed, stepping it cannot fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarbonCycleError {
    #[error(
        "Run length must be between 1 and {max} years, got {0}",
        max = crate::scenario::MAX_RUN_LENGTH
    )]
    InvalidRunLength(usize),
    #[error("Unknown era '{0}'. Expected 'pre-industrial' or 'modern'")]
    InvalidEra(String),
    #[error("Unknown response style '{0}'. Expected 'constant' or 'variable'")]
    InvalidResponseStyle(String),
    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidParameter {
        field: String,
        value: f64,
        reason: String,
    },
    #[error("Degenerate calibration for flux '{flux}': {reason}")]
    DegenerateCalibration { flux: String, reason: String },
    #[error("Could not parse scenario configuration: {0}")]
    InvalidConfig(String),
}

impl From<toml::de::Error> for CarbonCycleError {
    fn from(err: toml::de::Error) -> Self {
        CarbonCycleError::InvalidConfig(err.message().to_string())
    }
}

/// Convenience type for `Result<T, CarbonCycleError>`.
pub type CarbonCycleResult<T> = Result<T, CarbonCycleError>;
