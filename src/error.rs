use std::fmt;
use thiserror::Error;

/// Why a page fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    NavigationFailed,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::NavigationFailed => write!(f, "navigation failed"),
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("Fetch failed ({kind}): {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self { kind: FetchErrorKind::Timeout, message: message.into() }
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self { kind: FetchErrorKind::NavigationFailed, message: message.into() }
    }
}

/// Why a store replace failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    ConnectionFailed,
    ConstraintViolation,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErrorKind::ConnectionFailed => write!(f, "connection failed"),
            StoreErrorKind::ConstraintViolation => write!(f, "constraint violation"),
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("Store error ({kind}): {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self { kind: StoreErrorKind::ConnectionFailed, message: message.into() }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self { kind: StoreErrorKind::ConstraintViolation, message: message.into() }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::constraint(err.to_string())
            }
            _ => StoreError::connection(err.to_string()),
        }
    }
}

/// A numeric run was found in a cell but could not be read as a decimal.
/// Never escapes the row it was raised for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed number '{run}': {reason}")]
pub struct FieldParseError {
    pub run: String,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum RateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown vendor: {0}")]
    UnknownVendor(String),
}

pub type Result<T> = std::result::Result<T, RateError>;
