//! RTCP scheduling math and compound-packet composition.
//!
//! The adaptive interval algorithm is
//! [rfc3550 appendix A.7](https://datatracker.ietf.org/doc/html/rfc3550#appendix-A.7)
//! in its conservative form: a fixed 5 second floor, a divide-by-e on the
//! very first transmission, and a uniform random factor in `[0.5, 1.5]`
//! applied to every computed interval.

use std::time::Duration;

use codec::{
    ntp::NtpTimestamp,
    rtcp::{Packet, ReceiverReport, ReceptionReportBlock, SdesChunk, SenderReport, SourceDescription},
};
use rand::Rng;

/// Minimum RTCP reporting interval, regardless of computed bandwidth share.
pub const MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Starting estimate for `avg_rtcp_size`, per rfc3550 §6.3 (before any
/// packet has actually been sent, it must still be possible to compute the
/// very first interval).
pub const INITIAL_AVG_RTCP_SIZE: f64 = 200.0;

/// Fraction of session bandwidth RTCP traffic is allowed to consume.
pub const DEFAULT_BANDWIDTH_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct SenderInfo {
    pub ntp_time: NtpTimestamp,
    pub rtp_timestamp: u32,
    pub packet_count: u32,
    pub octet_count: u32,
}

/// Tracks the exponentially-smoothed average RTCP packet size and produces
/// the next send interval on demand.
pub struct IntervalScheduler {
    avg_rtcp_size: f64,
    bandwidth_fraction: f64,
    first_transmission: bool,
}

impl IntervalScheduler {
    pub fn new(bandwidth_fraction: f64) -> Self {
        Self {
            avg_rtcp_size: INITIAL_AVG_RTCP_SIZE,
            bandwidth_fraction,
            first_transmission: true,
        }
    }

    /// Folds a just-sent or just-received RTCP packet's size into the
    /// running average (rfc3550 §6.3.3, the "avg_rtcp_size" update).
    pub fn observe_packet_size(&mut self, size: usize) {
        self.avg_rtcp_size += (size as f64 - self.avg_rtcp_size) / 16.0;
    }

    pub fn next_interval(&mut self, members: u32) -> Duration {
        self.next_interval_with_rng(members, &mut rand::rng())
    }

    pub fn next_interval_with_rng<R: Rng + ?Sized>(&mut self, members: u32, rng: &mut R) -> Duration {
        let n = members.max(1) as f64;
        let mut seconds = self.avg_rtcp_size * n / self.bandwidth_fraction;

        if seconds < MIN_INTERVAL.as_secs_f64() {
            seconds = MIN_INTERVAL.as_secs_f64();
        }

        if self.first_transmission {
            seconds /= std::f64::consts::E;
            self.first_transmission = false;
        }

        let factor = rng.random_range(0.5..1.5);
        Duration::from_secs_f64(seconds * factor)
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BANDWIDTH_FRACTION)
    }
}

/// Builds the SR-or-RR-plus-SDES compound packet a session sends on each
/// RTCP tick. `sender_info` is `Some` exactly when this session has sent at
/// least one RTP packet, which decides SR vs RR (rfc3550 §6.4).
pub fn compose_compound(
    local_ssrc: u32,
    sender_info: Option<SenderInfo>,
    reports: Vec<ReceptionReportBlock>,
    cname: String,
) -> Vec<Packet> {
    let mut packets = Vec::with_capacity(2);

    match sender_info {
        Some(info) => packets.push(Packet::SenderReport(SenderReport {
            ssrc: local_ssrc,
            ntp_time: info.ntp_time,
            rtp_timestamp: info.rtp_timestamp,
            packet_count: info.packet_count,
            octet_count: info.octet_count,
            reports,
        })),
        None => packets.push(Packet::ReceiverReport(ReceiverReport {
            ssrc: local_ssrc,
            reports,
        })),
    }

    packets.push(Packet::SourceDescription(SourceDescription {
        chunks: vec![SdesChunk {
            ssrc: local_ssrc,
            items: vec![codec::rtcp::SdesItem {
                kind: codec::rtcp::SdesItemType::Cname,
                text: cname,
            }],
        }],
    }));

    packets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_below_floor() {
        let mut scheduler = IntervalScheduler::new(0.05);
        // First transmission divides by e but a tiny n keeps us at the floor
        // either way.
        let interval = scheduler.next_interval_with_rng(1, &mut rand::rng());
        assert!(interval.as_secs_f64() >= MIN_INTERVAL.as_secs_f64() / std::f64::consts::E * 0.5);
    }

    #[test]
    fn scales_with_membership() {
        let mut scheduler = IntervalScheduler::new(0.05);
        scheduler.observe_packet_size(2000);
        let small = scheduler.next_interval_with_rng(1, &mut rand::rng());
        let mut scheduler2 = IntervalScheduler::new(0.05);
        scheduler2.observe_packet_size(2000);
        let large = scheduler2.next_interval_with_rng(100, &mut rand::rng());
        assert!(large > small);
    }

    #[test]
    fn composes_sr_when_sender_info_present() {
        let packets = compose_compound(
            1,
            Some(SenderInfo {
                ntp_time: NtpTimestamp::from_parts(0, 0),
                rtp_timestamp: 0,
                packet_count: 0,
                octet_count: 0,
            }),
            vec![],
            "cname".into(),
        );
        assert!(matches!(packets[0], Packet::SenderReport(_)));
        assert!(matches!(packets[1], Packet::SourceDescription(_)));
    }

    #[test]
    fn composes_rr_without_sender_info() {
        let packets = compose_compound(1, None, vec![], "cname".into());
        assert!(matches!(packets[0], Packet::ReceiverReport(_)));
    }
}
