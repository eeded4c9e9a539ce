use std::fmt;

/// The shared error type threaded through every Wessley component.
///
/// Variants map 1:1 onto the error kinds in the error-handling design: a
/// component never invents a new error shape, it picks the variant that
/// matches how the failure should be handled upstream (retried, surfaced,
/// routed to the DLQ, or swallowed at collector granularity).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Input failed domain validation (C3). Carries the field, the offending
    /// value, and a sentinel kind for programmatic matching.
    #[error("validation failed: field={field} value={value:?}: {kind}")]
    Validation {
        field: &'static str,
        value: String,
        kind: ValidationKind,
    },

    /// HTTP 429/5xx, timeouts, connection resets, bus publish failures.
    /// Eligible for retry with exponential backoff.
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// Non-200/429/5xx HTTP, malformed responses. Not retried.
    #[error("terminal I/O error: {0}")]
    TerminalIo(String),

    /// Failure at an ingestion pipeline stage.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// A distinguished API-quota error that should halt the owning collector.
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Produced by any operation observing a cancelled context.
    #[error("operation cancelled")]
    Cancelled,

    /// The circuit breaker rejected the call.
    #[error("circuit open")]
    CircuitOpen,

    /// Rate limiter has no token available for a non-blocking `allow()`.
    #[error("rate limited")]
    RateLimited,

    /// Catch-all for adapter errors that don't cleanly fit another variant.
    #[error("{0}")]
    Other(String),
}

/// Sentinel discriminant carried by [`Error::Validation`] so callers can
/// match on the failure kind without parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    UnsupportedMake,
    UnsupportedModel,
    YearOutOfRange,
    InvalidVin,
    QueryTooShort,
    QueryInjection,
    QueryProfanity,
    EmptyContent,
    EmptySourceId,
    EmptyTitle,
    UnrecognisedSource,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationKind::UnsupportedMake => "unsupported make",
            ValidationKind::UnsupportedModel => "unsupported model",
            ValidationKind::YearOutOfRange => "year out of range",
            ValidationKind::InvalidVin => "invalid VIN",
            ValidationKind::QueryTooShort => "query too short",
            ValidationKind::QueryInjection => "query looks like an injection attempt",
            ValidationKind::QueryProfanity => "query contains a disallowed word",
            ValidationKind::EmptyContent => "content is empty",
            ValidationKind::EmptySourceId => "source_id is empty",
            ValidationKind::EmptyTitle => "title is empty",
            ValidationKind::UnrecognisedSource => "source is not in the recognised set",
        };
        f.write_str(s)
    }
}

impl Error {
    pub fn validation(field: &'static str, value: impl Into<String>, kind: ValidationKind) -> Self {
        Error::Validation {
            field,
            value: value.into(),
            kind,
        }
    }

    /// True if this error represents a condition that `retry` should retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientIo(_) | Error::CircuitOpen)
    }
}

/// The result type used throughout Wessley.
pub type Result<T> = std::result::Result<T, Error>;
