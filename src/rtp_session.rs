//! Outbound RTP generation: local SSRC, sequence number, and timestamp, plus
//! the counters those deposits feed into an RTCP sender report.

use std::sync::{
    atomic::{AtomicU16, AtomicU32, Ordering},
    Arc,
};

use codec::rtp::{encode_rtp, AudioPayloadType, RtpHeader};
use service::{stats::Stat, SessionStatistics};

use crate::{error::Result, transport::Transport};

pub struct RtpSession<T: Transport> {
    transport: Arc<T>,
    local_ssrc: u32,
    payload_type: AudioPayloadType,
    clock_rate: u32,
    sequence: AtomicU16,
    timestamp: AtomicU32,
    stats: Arc<SessionStatistics>,
}

impl<T: Transport> RtpSession<T> {
    pub fn new(
        transport: Arc<T>,
        local_ssrc: u32,
        payload_type: AudioPayloadType,
        initial_sequence: u16,
        initial_timestamp: u32,
        stats: Arc<SessionStatistics>,
    ) -> Self {
        let clock_rate = payload_type.clock_rate();
        Self {
            transport,
            local_ssrc,
            payload_type,
            clock_rate,
            sequence: AtomicU16::new(initial_sequence),
            timestamp: AtomicU32::new(initial_timestamp),
            stats,
        }
    }

    pub fn local_ssrc(&self) -> u32 {
        self.local_ssrc
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    pub fn current_timestamp(&self) -> u32 {
        self.timestamp.load(Ordering::Relaxed)
    }

    /// Sends one audio frame and advances sequence/timestamp for the next.
    /// `samples` is the number of RTP-clock ticks the frame represents, e.g.
    /// 160 for a 20ms frame at 8000 Hz.
    pub async fn send_audio(&self, payload: &[u8], samples: u32, marker: bool) -> Result<()> {
        let sequence_number = self.sequence.fetch_add(1, Ordering::Relaxed);
        let timestamp = self.timestamp.fetch_add(samples, Ordering::Relaxed);

        let header = RtpHeader {
            padding: false,
            extension: false,
            marker,
            payload_type: self.payload_type.number(),
            sequence_number,
            timestamp,
            ssrc: self.local_ssrc,
        };

        let bytes = encode_rtp(&header, &[], payload)?;
        self.transport.send_rtp(&bytes).await?;

        self.stats.record(Stat::PacketsSent(1));
        self.stats.record(Stat::BytesSent(bytes.len() as u64));

        Ok(())
    }

    /// Records an inbound RTP datagram's byte count. Decoding and per-source
    /// bookkeeping happen one layer up, where the source tracker lives.
    pub fn record_received(&self, size: usize) {
        self.stats.record(Stat::PacketsReceived(1));
        self.stats.record(Stat::BytesReceived(size as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::udp::UdpTransport;

    #[tokio::test]
    async fn send_audio_advances_sequence_and_timestamp() {
        let transport = Arc::new(
            UdpTransport::connect("127.0.0.1:0".parse().unwrap(), "127.0.0.1:1".parse().unwrap(), 1500)
                .await
                .unwrap(),
        );
        let stats = Arc::new(SessionStatistics::default());
        let session = RtpSession::new(transport, 0x1234, AudioPayloadType::Pcmu, 0, 0, stats.clone());

        let _ = session.send_audio(&[0xff; 160], 160, false).await;
        assert_eq!(session.current_timestamp(), 160);
        assert_eq!(stats.snapshot().packets_sent, 1);

        let _ = session.send_audio(&[0xff; 160], 160, false).await;
        assert_eq!(session.current_timestamp(), 320);
    }
}
