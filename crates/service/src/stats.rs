//! Atomic session counters.
//!
//! Mirrors the counter/dispatch shape used elsewhere in this workspace: a
//! small enum of countable events, a `Number` trait for the underlying
//! storage, and a struct of named counts that dispatches on the enum.

use std::sync::atomic::{AtomicU64, Ordering};

/// One observable event on the send or receive path.
#[derive(Debug, Clone, Copy)]
pub enum Stat {
    PacketsSent(u64),
    PacketsReceived(u64),
    BytesSent(u64),
    BytesReceived(u64),
    PacketsLost(u64),
    PacketsDropped(u64),
}

trait Number {
    fn add(&self, delta: u64);
    fn get(&self) -> u64;
}

#[derive(Default)]
struct Count(AtomicU64);

impl Number for Count {
    fn add(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Release);
    }

    fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Atomic aggregate counters for one session, split into an inbound group
/// and an outbound group so concurrent send/receive paths never contend on
/// the same cache line.
#[derive(Default)]
pub struct SessionStatistics {
    packets_sent: Count,
    packets_received: Count,
    bytes_sent: Count,
    bytes_received: Count,
    packets_lost: Count,
    packets_dropped: Count,
}

impl SessionStatistics {
    pub fn record(&self, stat: Stat) {
        match stat {
            Stat::PacketsSent(n) => self.packets_sent.add(n),
            Stat::PacketsReceived(n) => self.packets_received.add(n),
            Stat::BytesSent(n) => self.bytes_sent.add(n),
            Stat::BytesReceived(n) => self.bytes_received.add(n),
            Stat::PacketsLost(n) => self.packets_lost.add(n),
            Stat::PacketsDropped(n) => self.packets_dropped.add(n),
        }
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            packets_sent: self.packets_sent.get(),
            packets_received: self.packets_received.get(),
            bytes_sent: self.bytes_sent.get(),
            bytes_received: self.bytes_received.get(),
            packets_lost: self.packets_lost.get(),
            packets_dropped: self.packets_dropped.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_lost: u64,
    pub packets_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_snapshots() {
        let stats = SessionStatistics::default();
        stats.record(Stat::PacketsSent(3));
        stats.record(Stat::BytesSent(480));
        let snap = stats.snapshot();
        assert_eq!(snap.packets_sent, 3);
        assert_eq!(snap.bytes_sent, 480);
        assert_eq!(snap.packets_received, 0);
    }
}
