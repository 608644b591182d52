use std::fmt;

/// Errors raised by the source tracker and session registry.
#[derive(Debug)]
pub enum ServiceError {
    /// A packet failed sequence-continuity probation and its source was
    /// dropped without ever being validated.
    ValidationFailed,
    /// The source exceeded its configured packet budget for the current
    /// rate-limit window.
    RateLimited,
    /// `Registry::create` was called with an id already present.
    DuplicateId,
    /// `Registry::create` was called while already at `max_sessions`.
    CapacityExceeded,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed => write!(f, "source failed validation probation"),
            Self::RateLimited => write!(f, "source exceeded its rate limit"),
            Self::DuplicateId => write!(f, "duplicate session id"),
            Self::CapacityExceeded => write!(f, "registry capacity exceeded"),
        }
    }
}

impl std::error::Error for ServiceError {}

pub type Result<T> = std::result::Result<T, ServiceError>;
