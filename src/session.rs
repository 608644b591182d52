//! The session composite: binds one transport, one local RTP source, one
//! remote-source tracker, and the RTCP scheduler into the lifecycle
//! `Idle -> Active -> Closing -> Closed`.

use std::{sync::Arc, time::Instant};

use codec::rtp::{decode_rtp, AudioPayloadType};
use parking_lot::{Mutex, RwLock};
use service::{
    registry::ManagedSession,
    rtcp::SenderInfo,
    source::{RemoteSource, SourceTracker, SourceTrackerConfig},
    stats::Stat,
    Lifecycle, SessionState, SessionStatistics,
};
use tokio::{sync::watch, task::JoinHandle, time::Duration};

use crate::{
    error::{Error, IoErrorKind, Result},
    observer::{HandlerSlot, LoggingObserver, ObserverSourceHandler, SessionObserver},
    rtcp_session::{dispatch_inbound, now_as_ntp, RtcpSession},
    rtp_session::RtpSession,
    transport::{PacketKind, Transport},
    util::RandomSource,
};

pub use service::stats::StatisticsSnapshot;

/// How long a single `Transport::recv` waits before yielding a `Timeout`, so
/// the receive loop periodically re-checks the lifecycle state and the
/// cancellation signal instead of blocking on the socket forever.
const RECV_DEADLINE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub payload_type: AudioPayloadType,
    pub cname: String,
    pub rtcp_bandwidth_fraction: f64,
}

type Handler = ObserverSourceHandler;

pub struct Session<T: Transport> {
    id: String,
    lifecycle: Lifecycle,
    transport: Arc<T>,
    rtp: Arc<RtpSession<T>>,
    rtcp: Arc<RtcpSession<T>>,
    sources: Arc<SourceTracker<Handler>>,
    handler_slot: Arc<HandlerSlot>,
    stats: Arc<SessionStatistics>,
    last_activity: RwLock<Instant>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    cancel: watch::Sender<bool>,
}

impl<T: Transport> Session<T> {
    pub fn new(
        id: String,
        transport: Arc<T>,
        config: SessionConfig,
        source_config: SourceTrackerConfig,
        random: &dyn RandomSource,
    ) -> Arc<Self> {
        let local_ssrc = random.random_ssrc();
        let stats = Arc::new(SessionStatistics::default());

        let rtp = Arc::new(RtpSession::new(
            transport.clone(),
            local_ssrc,
            config.payload_type,
            random.random_sequence_start(),
            random.random_timestamp_start(),
            stats.clone(),
        ));

        let rtcp = Arc::new(RtcpSession::new(
            transport.clone(),
            local_ssrc,
            config.cname,
            config.rtcp_bandwidth_fraction,
        ));

        let handler_slot = HandlerSlot::new(id.clone(), Arc::new(LoggingObserver));
        let handler = ObserverSourceHandler::new(handler_slot.clone());
        let sources = SourceTracker::new(source_config, handler);
        let (cancel, _) = watch::channel(false);

        Arc::new(Self {
            id,
            lifecycle: Lifecycle::default(),
            transport,
            rtp,
            rtcp,
            sources,
            handler_slot,
            stats,
            last_activity: RwLock::new(Instant::now()),
            tasks: Mutex::new(Vec::new()),
            cancel,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn local_ssrc(&self) -> u32 {
        self.rtp.local_ssrc()
    }

    /// Replaces the session observer. Safe to call at any time, including
    /// while dispatch is in flight on the receive loop.
    pub fn set_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.handler_slot.swap(observer);
    }

    /// Moves `Idle -> Active` and spawns the receive loop and RTCP ticker.
    /// Returns [`Error::AlreadyStarted`] if the session was already started.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if !self.lifecycle.start() {
            return Err(Error::AlreadyStarted);
        }

        self.handler_slot.session_started();
        self.spawn_receive_loop();
        self.spawn_rtcp_ticker();

        Ok(())
    }

    fn spawn_receive_loop(self: &Arc<Self>) {
        let this = self.clone();
        let cancel = this.cancel.subscribe();
        let handle = tokio::spawn(async move {
            while this.lifecycle.is_active() {
                match this.transport.recv(RECV_DEADLINE, &cancel).await {
                    Ok((bytes, PacketKind::Rtp)) => this.handle_inbound_rtp(&bytes),
                    Ok((bytes, PacketKind::Rtcp)) => this.handle_inbound_rtcp(&bytes),
                    Err(Error::TransportIo { kind: IoErrorKind::Timeout, .. }) => continue,
                    Err(Error::Cancelled) => break,
                    Err(Error::TransportIo { kind: IoErrorKind::Temporary | IoErrorKind::Connection, source }) => {
                        log::warn!("transport recv error, continuing: {source}");
                        continue;
                    }
                    Err(err) => {
                        log::error!("transport recv failed permanently: {err}");
                        this.lifecycle.begin_close();
                        break;
                    }
                }
                *this.last_activity.write() = Instant::now();
            }
        });
        self.tasks.lock().push(handle);
    }

    fn handle_inbound_rtp(&self, bytes: &[u8]) {
        self.rtp.record_received(bytes.len());
        match decode_rtp(bytes) {
            Ok(packet) => {
                let ssrc = packet.header.ssrc;
                let sequence_number = packet.header.sequence_number;
                self.sources.update_from_packet(&packet);
                self.handler_slot.on_packet_received(ssrc, sequence_number);
            }
            Err(_) => self.stats.record(Stat::PacketsDropped(1)),
        }
    }

    fn handle_inbound_rtcp(&self, bytes: &[u8]) {
        match dispatch_inbound(bytes, &self.sources, self.local_ssrc()) {
            Ok(events) => {
                for event in &events {
                    self.handler_slot.on_rtcp_received(event);
                }
            }
            Err(_) => self.stats.record(Stat::PacketsDropped(1)),
        }
    }

    fn spawn_rtcp_ticker(self: &Arc<Self>) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            while this.lifecycle.is_active() {
                let members = this.sources.get_all().len() as u32 + 1;
                let interval = this.rtcp.next_interval(members);
                tokio::time::sleep(interval).await;

                if !this.lifecycle.is_active() {
                    break;
                }

                let snapshot = this.stats.snapshot();
                let sender_info = (snapshot.packets_sent > 0).then(|| SenderInfo {
                    ntp_time: now_as_ntp(),
                    rtp_timestamp: this.rtp.current_timestamp(),
                    packet_count: snapshot.packets_sent as u32,
                    octet_count: snapshot.bytes_sent as u32,
                });

                let reports = this.sources.report_blocks(Instant::now());
                let _ = this.rtcp.send_report(sender_info, reports).await;
            }
        });
        self.tasks.lock().push(handle);
    }

    pub async fn send_audio(&self, payload: &[u8], samples: u32, marker: bool) -> Result<()> {
        if !self.lifecycle.is_active() {
            return Err(Error::SessionNotActive);
        }
        *self.last_activity.write() = Instant::now();
        self.rtp.send_audio(payload, samples, marker).await
    }

    pub fn get_statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    pub fn get_sources(&self) -> Vec<RemoteSource> {
        self.sources.get_all()
    }

    pub fn stats_handle(&self) -> Arc<SessionStatistics> {
        self.stats.clone()
    }

    /// Moves to `Closed` from any state and tears down background tasks.
    /// Idempotent.
    pub fn stop(&self) {
        if self.lifecycle.close() {
            let _ = self.cancel.send(true);
            self.sources.stop();
            for task in self.tasks.lock().drain(..) {
                task.abort();
            }
            self.handler_slot.session_closed();
        }
    }
}

impl<T: Transport> ManagedSession for Session<T> {
    fn state(&self) -> SessionState {
        self.lifecycle.get()
    }

    fn last_activity(&self) -> Instant {
        *self.last_activity.read()
    }

    fn stop(&self) {
        Session::stop(self);
    }
}

/// The three transport layouts a session can be configured with, unified so
/// the registry can own them side by side. `Transport` itself is not object
/// safe (its methods are native `async fn`s), so this enum is the dispatch
/// point instead of a `dyn Transport`.
pub enum AnySession {
    Udp(Arc<Session<crate::transport::udp::UdpTransport>>),
    UdpRtcp(Arc<Session<crate::transport::udp_rtcp::UdpRtcpTransport>>),
    Muxed(Arc<Session<crate::transport::muxed::MuxedTransport>>),
}

macro_rules! any_session_dispatch {
    ($self:ident, $session:ident => $body:expr) => {
        match $self {
            AnySession::Udp($session) => $body,
            AnySession::UdpRtcp($session) => $body,
            AnySession::Muxed($session) => $body,
        }
    };
}

impl AnySession {
    pub fn id(&self) -> &str {
        any_session_dispatch!(self, session => session.id())
    }

    pub fn local_ssrc(&self) -> u32 {
        any_session_dispatch!(self, session => session.local_ssrc())
    }

    pub fn start(&self) -> Result<()> {
        any_session_dispatch!(self, session => session.start())
    }

    pub fn set_observer(&self, observer: Arc<dyn crate::observer::SessionObserver>) {
        any_session_dispatch!(self, session => session.set_observer(observer))
    }

    pub async fn send_audio(&self, payload: &[u8], samples: u32, marker: bool) -> Result<()> {
        any_session_dispatch!(self, session => session.send_audio(payload, samples, marker).await)
    }

    pub fn get_statistics(&self) -> StatisticsSnapshot {
        any_session_dispatch!(self, session => session.get_statistics())
    }

    pub fn get_sources(&self) -> Vec<RemoteSource> {
        any_session_dispatch!(self, session => session.get_sources())
    }

    pub fn stats_handle(&self) -> Arc<SessionStatistics> {
        any_session_dispatch!(self, session => session.stats_handle())
    }
}

impl ManagedSession for AnySession {
    fn state(&self) -> SessionState {
        any_session_dispatch!(self, session => session.state())
    }

    fn last_activity(&self) -> Instant {
        any_session_dispatch!(self, session => session.last_activity())
    }

    fn stop(&self) {
        any_session_dispatch!(self, session => session.stop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{transport::udp::UdpTransport, util::SystemRandom};

    async fn sample_session() -> Arc<Session<UdpTransport>> {
        let transport = Arc::new(
            UdpTransport::connect("127.0.0.1:0".parse().unwrap(), "127.0.0.1:1".parse().unwrap(), 1500)
                .await
                .unwrap(),
        );
        Session::new(
            "sess-1".to_string(),
            transport,
            SessionConfig {
                payload_type: AudioPayloadType::Pcmu,
                cname: "user@host".to_string(),
                rtcp_bandwidth_fraction: 0.05,
            },
            SourceTrackerConfig::default(),
            &SystemRandom,
        )
    }

    #[tokio::test]
    async fn send_audio_requires_active_session() {
        let session = sample_session().await;
        let err = session.send_audio(&[0; 160], 160, false).await.unwrap_err();
        assert!(matches!(err, Error::SessionNotActive));
    }

    #[tokio::test]
    async fn start_then_stop_transitions_lifecycle() {
        let session = sample_session().await;
        session.start().unwrap();
        assert_eq!(session.lifecycle.get(), SessionState::Active);
        session.send_audio(&[0; 160], 160, false).await.unwrap();
        session.stop();
        assert_eq!(session.lifecycle.get(), SessionState::Closed);
    }
}
