use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum Error {
    #[error("Invalid configuration: {doors} doors, expected {}..={}", crate::MIN_DOORS, crate::MAX_DOORS)]
    InvalidConfiguration { doors: u32 },
    #[error("Invalid state")]
    InvalidState,
    #[error("Invalid choice: door {door}")]
    InvalidChoice { door: u32 },
    #[error("Unknown door: {door}")]
    UnknownDoor { door: u32 },
    #[error("Interval too short: {interval_ms}ms < {min_ms}ms")]
    IntervalTooShort { interval_ms: u64, min_ms: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
