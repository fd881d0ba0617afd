//! Error taxonomy for the rebalancing engine.
//!
//! Only configuration problems are fatal (spec §7): invalid bucket widths,
//! malformed service windows, out-of-range hours, negative weights. Data
//! problems (malformed timestamps, unknown stations, self-loop trips) are
//! recovered locally and surfaced as diagnostics counters instead.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RebalError {
    #[error("bucket_minutes must be positive and divide 1440, got {0}")]
    InvalidBucketMinutes(u32),

    #[error("service_end_hour ({end}) must be greater than service_start_hour ({start})")]
    InvalidServiceWindow { start: u32, end: u32 },

    #[error("service hours must lie within [0, 24], got start={start} end={end}")]
    ServiceHoursOutOfRange { start: u32, end: u32 },

    #[error("weight `{name}` must be non-negative, got {value}")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("failed to load `{what}` from {path}: {reason}")]
    Load {
        what: &'static str,
        path: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, RebalError>;
