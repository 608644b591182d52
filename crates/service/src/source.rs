//! Per-remote-SSRC tracking: sequence validation, loss, jitter, rate
//! limiting, and a background sweep that forgets sources gone silent.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    thread,
    time::{Duration, Instant},
};

use codec::{
    math,
    rtcp::{ReceptionReportBlock, SdesItem},
    rtp::Packet,
};
use parking_lot::RwLock;

use crate::error::ServiceError;
use crate::table::Table;

/// Consecutive in-order packets required before a newly observed SSRC is
/// trusted (rfc3550 §8.2 calls this the "switch" or probationary period).
pub const DEFAULT_PROBATION_PACKETS: u32 = 2;

/// Probation failures tolerated before a source is dropped outright.
pub const DEFAULT_MAX_PROBATION_FAILURES: u32 = 5;

/// Silence after which an untouched source is swept away.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub max_packets_per_second: u32,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_packets_per_second: 2000,
            window: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceTrackerConfig {
    pub probation_packets: u32,
    pub max_probation_failures: u32,
    pub source_timeout: Duration,
    pub rate_limit: Option<RateLimit>,
    /// RTP clock rate used to convert wall-clock arrival into jitter units.
    pub clock_rate: u32,
}

impl Default for SourceTrackerConfig {
    fn default() -> Self {
        Self {
            probation_packets: DEFAULT_PROBATION_PACKETS,
            max_probation_failures: DEFAULT_MAX_PROBATION_FAILURES,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            rate_limit: Some(RateLimit::default()),
            clock_rate: 8000,
        }
    }
}

/// State tracked for one remote synchronization source.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub ssrc: u32,
    pub cname: Option<String>,
    pub sdes: Vec<SdesItem>,

    base_seq: u16,
    last_seq: u16,
    cycles: u32,
    received_count: u64,
    cumulative_lost: i64,
    last_report_expected: u64,
    last_report_received: u64,

    jitter: f64,
    last_transit: Option<i64>,

    last_sr_middle32: Option<u32>,
    last_sr_received_at: Option<Instant>,

    pub first_seen: Instant,
    pub last_seen: Instant,
    pub active: bool,
    probation_good: u32,
    probation_failures: u32,
    pub validated: bool,

    window_start: Instant,
    packets_in_window: u32,
    pub rate_limited: bool,
}

impl RemoteSource {
    fn new(ssrc: u32, seq: u16, now: Instant) -> Self {
        Self {
            ssrc,
            cname: None,
            sdes: Vec::new(),
            base_seq: seq,
            last_seq: seq,
            cycles: 0,
            received_count: 0,
            cumulative_lost: 0,
            last_report_expected: 0,
            last_report_received: 0,
            jitter: 0.0,
            last_transit: None,
            last_sr_middle32: None,
            last_sr_received_at: None,
            first_seen: now,
            last_seen: now,
            active: true,
            probation_good: 0,
            probation_failures: 0,
            validated: false,
            window_start: now,
            packets_in_window: 0,
            rate_limited: false,
        }
    }

    /// `(cycles << 16) | seq`, the extended highest sequence number (rfc3550 §A.1).
    pub fn extended_highest_sequence(&self) -> u32 {
        (self.cycles << 16) | self.last_seq as u32
    }

    pub fn expected_packets(&self) -> u64 {
        (self.extended_highest_sequence() as u64).wrapping_sub(self.base_seq as u64) + 1
    }

    pub fn cumulative_lost(&self) -> i64 {
        self.cumulative_lost
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Fraction lost since the last time this was called, per rfc3550 §6.4.1.
    /// Resets the interval baseline as a side effect; call exactly once per
    /// RTCP reporting interval.
    pub fn fraction_lost_since_last_report(&mut self) -> u8 {
        let expected = self.expected_packets();
        let expected_interval = expected.saturating_sub(self.last_report_expected);
        let received_interval = self.received_count.saturating_sub(self.last_report_received);
        self.last_report_expected = expected;
        self.last_report_received = self.received_count;
        math::fraction_lost(expected_interval, received_interval)
    }

    pub fn record_sender_report(&mut self, ntp_middle32: u32, received_at: Instant) {
        self.last_sr_middle32 = Some(ntp_middle32);
        self.last_sr_received_at = Some(received_at);
    }

    /// Builds this source's reception report block. `now` is used to compute
    /// DLSR relative to the last SR received from it, if any.
    pub fn to_report_block(&mut self, now: Instant) -> ReceptionReportBlock {
        let delay_since_last_sr = match self.last_sr_received_at {
            Some(at) => (now.saturating_duration_since(at).as_secs_f64() * 65536.0) as u32,
            None => 0,
        };

        ReceptionReportBlock {
            ssrc: self.ssrc,
            fraction_lost: self.fraction_lost_since_last_report(),
            cumulative_lost: self.cumulative_lost,
            extended_highest_sequence: self.extended_highest_sequence(),
            jitter: self.jitter.round() as u32,
            last_sr: self.last_sr_middle32.unwrap_or(0),
            delay_since_last_sr,
        }
    }
}

/// Callbacks fired as sources are observed, validated, or forgotten.
///
/// All methods default to doing nothing, following the pattern used
/// elsewhere in this workspace for optional event hooks: implement only the
/// ones a particular deployment cares about.
#[allow(unused_variables)]
pub trait SourceHandler: Send + Sync + 'static {
    /// A packet was accepted from a source not seen before.
    fn on_source_added(&self, ssrc: u32) {}

    /// A source was removed, either by sweep (silence beyond
    /// `source_timeout`) or after exhausting its probation budget.
    fn on_source_removed(&self, ssrc: u32) {}

    /// A source crossed into or out of its rate-limit window.
    fn on_rate_limited(&self, ssrc: u32, limited: bool) {}
}

impl SourceHandler for () {}

pub enum UpdateOutcome {
    Accepted,
    Dropped(ServiceError),
}

/// Owns the live set of [`RemoteSource`]s for one RTP session and the
/// background thread that sweeps out sources gone silent.
pub struct SourceTracker<H: SourceHandler = ()> {
    sources: RwLock<Table<u32, RemoteSource>>,
    config: SourceTrackerConfig,
    handler: H,
    running: Arc<AtomicBool>,
}

impl<H: SourceHandler> SourceTracker<H> {
    pub fn new(config: SourceTrackerConfig, handler: H) -> Arc<Self> {
        let this = Arc::new(Self {
            sources: RwLock::new(Table::default()),
            config,
            handler,
            running: Arc::new(AtomicBool::new(true)),
        });

        let weak: Weak<Self> = Arc::downgrade(&this);
        let running = this.running.clone();
        thread::spawn(move || {
            let mut stale = Vec::with_capacity(16);
            while running.load(Ordering::Relaxed) {
                if let Some(this) = weak.upgrade() {
                    let now = Instant::now();
                    this.sources
                        .read()
                        .iter()
                        .filter(|(_, s)| now.saturating_duration_since(s.last_seen) > this.config.source_timeout)
                        .for_each(|(ssrc, _)| stale.push(*ssrc));

                    if !stale.is_empty() {
                        let mut sources = this.sources.write();
                        for ssrc in stale.drain(..) {
                            if sources.remove(&ssrc).is_some() {
                                this.handler.on_source_removed(ssrc);
                            }
                        }
                    }
                } else {
                    break;
                }
                thread::sleep(Duration::from_secs(1));
            }
        });

        this
    }

    /// Stops the background sweep thread. Does not clear tracked sources.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn get(&self, ssrc: u32) -> Option<RemoteSource> {
        self.sources.read().get(&ssrc).cloned()
    }

    pub fn get_all(&self) -> Vec<RemoteSource> {
        self.sources.read().values().cloned().collect()
    }

    /// Builds one reception report block per tracked source, mutating each
    /// source's interval baseline as a side effect. Call exactly once per
    /// RTCP reporting interval.
    pub fn report_blocks(&self, now: Instant) -> Vec<ReceptionReportBlock> {
        self.sources
            .write()
            .values_mut()
            .map(|source| source.to_report_block(now))
            .collect()
    }

    pub fn get_active(&self, within: Duration) -> Vec<RemoteSource> {
        let now = Instant::now();
        self.sources
            .read()
            .values()
            .filter(|s| now.saturating_duration_since(s.last_seen) <= within)
            .cloned()
            .collect()
    }

    pub fn remove(&self, ssrc: u32) -> Option<RemoteSource> {
        let removed = self.sources.write().remove(&ssrc);
        if removed.is_some() {
            self.handler.on_source_removed(ssrc);
        }
        removed
    }

    /// Records the NTP middle-32 timestamp from a sender report so a future
    /// reception report block can compute LSR/DLSR against it. No-op if the
    /// SSRC has never been observed on the receive path.
    pub fn record_sender_report(&self, ssrc: u32, ntp_middle32: u32, received_at: Instant) {
        if let Some(source) = self.sources.write().get_mut(&ssrc) {
            source.record_sender_report(ntp_middle32, received_at);
        }
    }

    /// Merges SDES items into the named source, creating it if unseen.
    pub fn update_from_sdes(&self, ssrc: u32, cname: Option<String>, items: Vec<SdesItem>) {
        let mut sources = self.sources.write();
        let now = Instant::now();
        let source = sources
            .entry(ssrc)
            .or_insert_with(|| RemoteSource::new(ssrc, 0, now));
        if cname.is_some() {
            source.cname = cname;
        }
        source.sdes = items;
    }

    /// Applies one inbound RTP packet to its source's state. This is the
    /// single mutation path for a given SSRC: callers are expected to call
    /// it from the session's receive loop, which processes packets in
    /// arrival order.
    pub fn update_from_packet(&self, packet: &Packet<'_>) -> UpdateOutcome {
        let ssrc = packet.header.ssrc;
        let seq = packet.header.sequence_number;
        let now = Instant::now();

        let mut sources = self.sources.write();

        if let Some(limit) = &self.config.rate_limit {
            if let Some(existing) = sources.get_mut(&ssrc) {
                if now.saturating_duration_since(existing.window_start) > limit.window {
                    existing.window_start = now;
                    existing.packets_in_window = 0;
                    if existing.rate_limited {
                        existing.rate_limited = false;
                        self.handler.on_rate_limited(ssrc, false);
                    }
                }
                existing.packets_in_window += 1;
                if existing.packets_in_window > limit.max_packets_per_second {
                    if !existing.rate_limited {
                        existing.rate_limited = true;
                        self.handler.on_rate_limited(ssrc, true);
                    }
                    return UpdateOutcome::Dropped(ServiceError::RateLimited);
                }
            }
        }

        let is_new = !sources.contains_key(&ssrc);
        let source = sources
            .entry(ssrc)
            .or_insert_with(|| RemoteSource::new(ssrc, seq, now));

        if is_new {
            drop(sources);
            self.handler.on_source_added(ssrc);
            sources = self.sources.write();
        }

        let source = match sources.get_mut(&ssrc) {
            Some(s) => s,
            None => return UpdateOutcome::Accepted,
        };

        if !source.validated {
            let expected = source.last_seq.wrapping_add(1);
            let in_order = seq == expected;
            let jump = (seq as i32 - source.last_seq as i32).unsigned_abs();

            if in_order || jump <= 100 {
                source.probation_good += 1;
                if source.probation_good >= self.config.probation_packets {
                    source.validated = true;
                }
            } else {
                source.probation_good = 0;
                source.probation_failures += 1;
                if source.probation_failures >= self.config.max_probation_failures {
                    let ssrc = source.ssrc;
                    sources.remove(&ssrc);
                    drop(sources);
                    self.handler.on_source_removed(ssrc);
                    return UpdateOutcome::Dropped(ServiceError::ValidationFailed);
                }
            }
        }

        if seq < source.last_seq && (source.last_seq - seq) as u32 > (1 << 15) {
            source.cycles += 1;
        }
        source.last_seq = seq;

        let extended = source.extended_highest_sequence();
        let expected_total = (extended as u64).wrapping_sub(source.base_seq as u64) + 1;
        if expected_total > source.received_count + 1 {
            source.cumulative_lost += (expected_total - source.received_count - 1) as i64;
        }

        let transit = now
            .saturating_duration_since(source.first_seen)
            .as_secs_f64()
            * self.config.clock_rate as f64
            - packet.header.timestamp as f64;
        math::update_jitter(&mut source.jitter, transit as i64, source.last_transit);
        source.last_transit = Some(transit as i64);

        source.received_count += 1;
        source.last_seen = now;
        source.active = true;

        UpdateOutcome::Accepted
    }
}

impl<H: SourceHandler> Drop for SourceTracker<H> {
    fn drop(&mut self) {
        self.stop();
    }
}
