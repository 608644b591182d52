//! Session-level building blocks for an RTP/RTCP engine: per-source
//! tracking, statistics counters, the RTCP interval scheduler, lifecycle,
//! and a registry that owns many concurrent sessions.
//!
//! This crate knows nothing about sockets; it is pure state and scheduling
//! math, driven by whatever transport the caller wires up.

pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod rtcp;
pub mod source;
pub mod stats;
mod table;

pub use error::ServiceError;
pub use lifecycle::{Lifecycle, SessionState};
pub use registry::{ManagedSession, Registry, RegistryConfig};
pub use source::{RemoteSource, SourceHandler, SourceTracker, SourceTrackerConfig};
pub use stats::SessionStatistics;
