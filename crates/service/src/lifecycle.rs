//! Session lifecycle states and their one-way transitions.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Active = 1,
    Closing = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Active,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// An atomically observable lifecycle state, enforcing the one-way
/// transition order `Idle -> Active -> Closing -> Closed`.
pub struct Lifecycle(AtomicU8);

impl Default for Lifecycle {
    fn default() -> Self {
        Self(AtomicU8::new(SessionState::Idle as u8))
    }
}

impl Lifecycle {
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `Idle -> Active`. Returns false if not currently `Idle`.
    pub fn start(&self) -> bool {
        self.0
            .compare_exchange(
                SessionState::Idle as u8,
                SessionState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves `Active -> Closing`. Returns false if not currently `Active`.
    pub fn begin_close(&self) -> bool {
        self.0
            .compare_exchange(
                SessionState::Active as u8,
                SessionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves to `Closed` from any state. Returns false if already `Closed`.
    pub fn close(&self) -> bool {
        let prev = self.0.swap(SessionState::Closed as u8, Ordering::AcqRel);
        prev != SessionState::Closed as u8
    }

    pub fn is_active(&self) -> bool {
        self.get() == SessionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_from_idle_only() {
        let lc = Lifecycle::default();
        assert!(lc.start());
        assert!(!lc.start());
        assert_eq!(lc.get(), SessionState::Active);
    }

    #[test]
    fn close_is_idempotent() {
        let lc = Lifecycle::default();
        assert!(lc.close());
        assert!(!lc.close());
        assert_eq!(lc.get(), SessionState::Closed);
    }

    #[test]
    fn begin_close_requires_active() {
        let lc = Lifecycle::default();
        assert!(!lc.begin_close());
        lc.start();
        assert!(lc.begin_close());
        assert_eq!(lc.get(), SessionState::Closing);
    }
}
