//! The root crate's unified error type.
//!
//! Lower layers (`codec`, `service`) keep their own small error enums;
//! everything that reaches a caller of this crate is wrapped into one of
//! these variants, tagged with the operation that produced it.

use std::fmt;

/// Classification of an OS-level transport error, so callers can decide
/// whether to retry, back off, or give up on a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorKind {
    Timeout,
    Temporary,
    Connection,
    Permanent,
    Unknown,
}

impl IoErrorKind {
    pub fn classify(error: &std::io::Error) -> Self {
        use std::io::ErrorKind as K;
        match error.kind() {
            K::TimedOut => Self::Timeout,
            K::WouldBlock | K::Interrupted => Self::Temporary,
            K::ConnectionReset | K::ConnectionRefused | K::ConnectionAborted | K::NotConnected => {
                Self::Connection
            }
            K::PermissionDenied | K::InvalidInput | K::Unsupported | K::AddrInUse => {
                Self::Permanent
            }
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for IoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Temporary => write!(f, "temporary"),
            Self::Connection => write!(f, "connection"),
            Self::Permanent => write!(f, "permanent"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    ConfigInvalid(String),
    SessionNotActive,
    AlreadyStarted,
    Codec(codec::Error),
    Service(service::ServiceError),
    TransportIo { kind: IoErrorKind, source: std::io::Error },
    NoPeer,
    Cancelled,
    /// Wraps any of the above with the name of the operation that failed,
    /// e.g. `"rtcp send"`.
    Context { operation: &'static str, source: Box<Error> },
}

impl Error {
    pub fn context(self, operation: &'static str) -> Self {
        Self::Context {
            operation,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigInvalid(reason) => write!(f, "invalid configuration: {reason}"),
            Self::SessionNotActive => write!(f, "session is not active"),
            Self::AlreadyStarted => write!(f, "session already started"),
            Self::Codec(e) => write!(f, "codec error: {e}"),
            Self::Service(e) => write!(f, "service error: {e}"),
            Self::TransportIo { kind, source } => write!(f, "transport io error ({kind}): {source}"),
            Self::NoPeer => write!(f, "no peer address configured"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Context { operation, source } => write!(f, "{operation}: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            Self::Service(e) => Some(e),
            Self::TransportIo { source, .. } => Some(source),
            Self::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<codec::Error> for Error {
    fn from(e: codec::Error) -> Self {
        Self::Codec(e)
    }
}

impl From<service::ServiceError> for Error {
    fn from(e: service::ServiceError) -> Self {
        Self::Service(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        let kind = IoErrorKind::classify(&e);
        Self::TransportIo { kind, source: e }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
