//! Error taxonomy shared by every component (spec §7).
//!
//! The engine exposes exactly four kinds of failure: transient, permanent,
//! operational (not an error — counters only) and internal. Every
//! component-level error type carries a `kind()` accessor so the Scheduler
//! can classify a failure without string matching.

use std::fmt;

/// The taxonomy kind. Not every component can produce every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Permanent,
    Operational,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Dns,
    Tls,
    ConnectionReset,
    HttpError(u16),
    TooLarge,
    Cancelled,
    InvalidUrl,
}

impl FetchErrorKind {
    /// Classifies the kind per spec §7. The retryable/permanent split for
    /// HTTP status codes is itself config-driven (see `config::RetryPolicy`);
    /// this is the taxonomy-level default used when no override is supplied.
    pub fn class(&self, retryable_status: impl Fn(u16) -> bool) -> ErrorClass {
        match self {
            FetchErrorKind::Timeout
            | FetchErrorKind::Dns
            | FetchErrorKind::ConnectionReset => ErrorClass::Transient,
            FetchErrorKind::Tls => ErrorClass::Transient,
            FetchErrorKind::HttpError(code) => {
                if retryable_status(*code) {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Permanent
                }
            }
            FetchErrorKind::TooLarge | FetchErrorKind::InvalidUrl => ErrorClass::Permanent,
            FetchErrorKind::Cancelled => ErrorClass::Operational,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Dns => write!(f, "dns"),
            FetchErrorKind::Tls => write!(f, "tls"),
            FetchErrorKind::ConnectionReset => write!(f, "connection_reset"),
            FetchErrorKind::HttpError(c) => write!(f, "http_error({c})"),
            FetchErrorKind::TooLarge => write!(f, "too_large"),
            FetchErrorKind::Cancelled => write!(f, "cancelled"),
            FetchErrorKind::InvalidUrl => write!(f, "invalid_url"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("fetch failed for {url}: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self { url: url.into(), kind, source: None }
    }

    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// All four fallback strategies failed to reach `min_readable_chars`.
    ContentUnusable,
}

impl fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content_unusable")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("extraction failed for {url}: {kind}")]
pub struct ExtractionError {
    pub url: String,
    pub kind: ExtractionErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterErrorKind {
    Transient,
    Timeout,
    CircuitOpen,
    Fatal,
}

#[derive(Debug, thiserror::Error)]
#[error("adapter call failed: {kind:?} ({message})")]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { kind: AdapterErrorKind::Transient, message: message.into() }
    }

    pub fn circuit_open() -> Self {
        Self { kind: AdapterErrorKind::CircuitOpen, message: "circuit breaker open".into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("unique constraint violated on {entity}")]
    UniqueViolation { entity: &'static str },
    #[error("entity not found: {entity} id={id}")]
    NotFound { entity: &'static str, id: uuid::Uuid },
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Internal-category engine error. A second consecutive occurrence on the
/// same component transitions the owning job to `Failed` (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("database error: {0}")]
    Db(String),
    #[error("panic in component {component}: {message}")]
    PanicInComponent { component: &'static str, message: String },
}
