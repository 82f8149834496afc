//! Error types for zonesync
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Resource not found at the provider
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Malformed zone file text
    #[error("Zone file parse error at line {line}: {message}")]
    ZoneParse {
        /// 1-based line number of the offending entry
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The zone model has no parser for this record type
    #[error("Record type not recognized: {0}")]
    TypeNotRecognized(String),

    /// A recordset for this name and type is already present
    #[error("Recordset already exists: {name} {rtype}")]
    RecordSetExists {
        /// Fully qualified owner name
        name: String,
        /// Record type mnemonic
        rtype: String,
    },

    /// No recordset for this name and type
    #[error("Recordset not found: {name} {rtype}")]
    RecordSetMissing {
        /// Fully qualified owner name
        name: String,
        /// Record type mnemonic
        rtype: String,
    },

    /// Malformed record data for a known type
    #[error("Invalid {rtype} record data '{value}': {reason}")]
    InvalidRecordData {
        /// Record type mnemonic
        rtype: String,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// SOA serial number errors
    #[error("Serial number error: {0}")]
    Serial(#[from] SerialError),

    /// Label transport errors
    #[error("Label error: {0}")]
    Label(#[from] LabelError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the SOA serial-number codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// Not exactly ten digits
    #[error("serial number '{0}' must be exactly 10 digits")]
    Malformed(String),

    /// The date part does not parse as YYYYMMDD
    #[error("serial number '{0}' does not start with a valid date")]
    InvalidDate(String),

    /// The date part lies after today
    #[error("serial number '{0}' carries a future date")]
    FutureDate(String),

    /// Version outside 0..=99
    #[error("serial version {0} is out of range (0-99)")]
    VersionOutOfRange(u32),

    /// Version 99 already used today
    #[error("serial version ceiling reached for {0}")]
    CeilingReached(String),
}

/// Errors raised while decoding transported labels
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// A pair without `=`
    #[error("label pair '{0}' is not of the form key=value")]
    MalformedPair(String),

    /// Key is empty
    #[error("label key cannot be empty")]
    EmptyKey,

    /// Key or value contains characters outside `[A-Za-z0-9_./-]`
    #[error("label {field} '{text}' contains disallowed characters")]
    DisallowedCharacters {
        /// "key" or "value"
        field: &'static str,
        /// Offending text
        text: String,
    },

    /// Key or value longer than 63 characters
    #[error("label {field} '{text}' exceeds 63 characters")]
    TooLong {
        /// "key" or "value"
        field: &'static str,
        /// Offending text
        text: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a zone file parse error
    pub fn zone_parse(line: usize, message: impl Into<String>) -> Self {
        Self::ZoneParse {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid record data error
    pub fn record_data(
        rtype: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRecordData {
            rtype: rtype.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
