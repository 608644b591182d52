//! Socket layouts a session can run over: a single UDP socket per media
//! direction, RTP and RTCP split across two sockets, or both muxed onto one
//! socket per rfc5761.
//!
//! Unlike a listener that fans a single bound socket out to many peers, an
//! RTP session already has exactly one remote peer (negotiated out of band,
//! typically via SDP) by the time a transport is built, so there is no
//! per-peer routing table here.

pub mod muxed;
pub mod udp;
pub mod udp_rtcp;

#[cfg(feature = "dtls")]
pub mod dtls;

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::{sync::watch, time::Duration};

use crate::error::{Error, IoErrorKind, Result};

/// Which of the two logical channels a received datagram belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Rtp,
    Rtcp,
}

/// Broadcasts a one-way "shut down now" signal to every `recv()` in flight.
pub type CancelSignal = watch::Receiver<bool>;

/// A bound, peer-connected transport a session drives directly.
///
/// Implementations are expected to `connect()` their underlying sockets to
/// the remote peer, so `send_rtp`/`send_rtcp` never need an address and
/// `recv` only ever yields datagrams from that one peer.
pub trait Transport: Send + Sync + 'static {
    async fn send_rtp(&self, buf: &[u8]) -> Result<()>;

    async fn send_rtcp(&self, buf: &[u8]) -> Result<()>;

    /// Waits for the next datagram on either channel, up to `deadline`, or
    /// until `cancel` is signalled. Yields `Error::TransportIo` classified
    /// as `IoErrorKind::Timeout` on deadline expiry and `Error::Cancelled`
    /// when the cancellation signal fires.
    async fn recv(&self, deadline: Duration, cancel: &CancelSignal) -> Result<(Bytes, PacketKind)>;

    fn peer_addr(&self) -> SocketAddr;
}

/// Races a socket-recv future against a deadline and a cancellation signal.
/// Shared by every `Transport::recv` implementation so the timeout/cancel
/// plumbing lives in one place.
pub(crate) async fn race_deadline<F, T>(deadline: Duration, cancel: &CancelSignal, recv: F) -> Result<T>
where
    F: std::future::Future<Output = std::io::Result<T>>,
{
    let mut cancel = cancel.clone();
    tokio::select! {
        result = recv => Ok(result?),
        _ = tokio::time::sleep(deadline) => Err(Error::TransportIo {
            kind: IoErrorKind::Timeout,
            source: std::io::Error::from(std::io::ErrorKind::TimedOut),
        }),
        _ = cancel.changed() => Err(Error::Cancelled),
    }
}
