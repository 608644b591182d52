//! Compound RTCP composition on the send side, and dispatch of decoded
//! inbound RTCP onto the source tracker on the receive side.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use codec::{
    math::round_trip_estimate,
    ntp::NtpTimestamp,
    rtcp::{decode_compound, App, Bye, Packet, ReceptionReportBlock},
};
use parking_lot::Mutex;
use service::{
    rtcp::{compose_compound, IntervalScheduler, SenderInfo},
    source::{SourceHandler, SourceTracker},
};

use crate::{error::Result, transport::Transport};

/// A notable event surfaced while dispatching an inbound compound packet.
/// Sessions deliver these to the session observer; nothing in this crate
/// acts on a `Bye`/`App` beyond surfacing it.
#[derive(Debug, Clone)]
pub enum RtcpEvent {
    SenderReport { ssrc: u32 },
    ReceiverReport { ssrc: u32 },
    SourceDescription { ssrc: u32 },
    /// A round-trip estimate derived from a report block whose target SSRC
    /// was ours, per rfc3550 §6.4.1. `ssrc` is the reporter that sent it.
    RoundTripEstimate { ssrc: u32, rtt: Duration },
    Bye(Bye),
    App(App),
}

/// Current wall-clock time as an NTP timestamp, used both to stamp outgoing
/// SRs and as the arrival time `A` in the RTT formula.
pub fn now_as_ntp() -> NtpTimestamp {
    NtpTimestamp::from_system_time(std::time::SystemTime::now())
}

pub struct RtcpSession<T: Transport> {
    transport: Arc<T>,
    local_ssrc: u32,
    cname: String,
    scheduler: Mutex<IntervalScheduler>,
}

impl<T: Transport> RtcpSession<T> {
    pub fn new(transport: Arc<T>, local_ssrc: u32, cname: String, bandwidth_fraction: f64) -> Self {
        Self {
            transport,
            local_ssrc,
            cname,
            scheduler: Mutex::new(IntervalScheduler::new(bandwidth_fraction)),
        }
    }

    /// Builds and sends one SR-or-RR-plus-SDES compound packet.
    pub async fn send_report(
        &self,
        sender_info: Option<SenderInfo>,
        reports: Vec<ReceptionReportBlock>,
    ) -> Result<()> {
        let packets = compose_compound(self.local_ssrc, sender_info, reports, self.cname.clone());
        let bytes = codec::rtcp::encode_compound(&packets)?;
        self.transport.send_rtcp(&bytes).await?;
        self.scheduler.lock().observe_packet_size(bytes.len());
        Ok(())
    }

    /// The next scheduled interval, per rfc3550 appendix A.7, given the
    /// current estimate of session membership.
    pub fn next_interval(&self, members: u32) -> Duration {
        self.scheduler.lock().next_interval(members)
    }
}

/// Surfaces a round-trip estimate if `block` targets `local_ssrc` and
/// carries a usable LSR.
fn round_trip_from_block(block: &ReceptionReportBlock, local_ssrc: u32, arrival_middle32: u32) -> Option<Duration> {
    if block.ssrc != local_ssrc {
        return None;
    }
    round_trip_estimate(block.last_sr, block.delay_since_last_sr, arrival_middle32)
}

/// Decodes an inbound compound packet and applies it to `tracker`, returning
/// the events a caller may want to react to. `local_ssrc` identifies which
/// report blocks, if any, describe round trips to us.
pub fn dispatch_inbound<H: SourceHandler>(
    bytes: &[u8],
    tracker: &SourceTracker<H>,
    local_ssrc: u32,
) -> Result<Vec<RtcpEvent>> {
    let packets = decode_compound(bytes)?;
    let now = Instant::now();
    let arrival_middle32 = now_as_ntp().middle_32();
    let mut events = Vec::with_capacity(packets.len());

    for packet in packets {
        match packet {
            Packet::SenderReport(sr) => {
                tracker.record_sender_report(sr.ssrc, sr.ntp_time.middle_32(), now);
                events.push(RtcpEvent::SenderReport { ssrc: sr.ssrc });
                for block in &sr.reports {
                    if let Some(rtt) = round_trip_from_block(block, local_ssrc, arrival_middle32) {
                        events.push(RtcpEvent::RoundTripEstimate { ssrc: sr.ssrc, rtt });
                    }
                }
            }
            Packet::ReceiverReport(rr) => {
                events.push(RtcpEvent::ReceiverReport { ssrc: rr.ssrc });
                for block in &rr.reports {
                    if let Some(rtt) = round_trip_from_block(block, local_ssrc, arrival_middle32) {
                        events.push(RtcpEvent::RoundTripEstimate { ssrc: rr.ssrc, rtt });
                    }
                }
            }
            Packet::SourceDescription(sdes) => {
                for chunk in sdes.chunks {
                    let cname = chunk
                        .items
                        .iter()
                        .find(|item| item.kind == codec::rtcp::SdesItemType::Cname)
                        .map(|item| item.text.clone());
                    tracker.update_from_sdes(chunk.ssrc, cname, chunk.items.clone());
                    events.push(RtcpEvent::SourceDescription { ssrc: chunk.ssrc });
                }
            }
            Packet::Bye(bye) => events.push(RtcpEvent::Bye(bye)),
            Packet::App(app) => events.push(RtcpEvent::App(app)),
        }
    }

    Ok(events)
}
