//! Time and randomness sources, abstracted behind traits so the session
//! layer can be driven deterministically in tests.

use std::time::{Instant, SystemTime};

use rand::Rng;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn system_now(&self) -> SystemTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Generates the random values rfc3550 requires for SSRC, initial sequence
/// number, and initial RTP timestamp (§3, "it is RECOMMENDED that the
/// initial value of the sequence number be random").
pub trait RandomSource: Send + Sync + 'static {
    fn random_ssrc(&self) -> u32;
    fn random_sequence_start(&self) -> u16;
    fn random_timestamp_start(&self) -> u32;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn random_ssrc(&self) -> u32 {
        rand::rng().random()
    }

    fn random_sequence_start(&self) -> u16 {
        rand::rng().random()
    }

    fn random_timestamp_start(&self) -> u32 {
        rand::rng().random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
