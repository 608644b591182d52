//! RTP and RTCP sharing one socket, demultiplexed per rfc5761 by inspecting
//! the first bytes of each datagram (`codec::is_rtcp`).

use std::{net::SocketAddr, sync::Arc};

use bytes::{Bytes, BytesMut};
use tokio::{net::UdpSocket as TokioUdpSocket, time::Duration};

use crate::{
    error::Result,
    transport::{race_deadline, CancelSignal, PacketKind, Transport},
};

pub struct MuxedTransport {
    socket: Arc<TokioUdpSocket>,
    peer: SocketAddr,
    mtu: usize,
}

impl MuxedTransport {
    pub async fn connect(listen: SocketAddr, peer: SocketAddr, mtu: usize) -> Result<Self> {
        let socket = TokioUdpSocket::bind(listen).await?;
        socket.connect(peer).await?;
        Ok(Self {
            socket: Arc::new(socket),
            peer,
            mtu,
        })
    }
}

impl Transport for MuxedTransport {
    async fn send_rtp(&self, buf: &[u8]) -> Result<()> {
        self.socket.send(buf).await?;
        Ok(())
    }

    async fn send_rtcp(&self, buf: &[u8]) -> Result<()> {
        self.socket.send(buf).await?;
        Ok(())
    }

    async fn recv(&self, deadline: Duration, cancel: &CancelSignal) -> Result<(Bytes, PacketKind)> {
        let mut buffer = BytesMut::zeroed(self.mtu);
        let size = race_deadline(deadline, cancel, self.socket.recv(&mut buffer)).await?;
        buffer.truncate(size);

        let bytes = buffer.freeze();
        let kind = if codec::is_rtcp(&bytes) {
            PacketKind::Rtcp
        } else {
            PacketKind::Rtp
        };

        Ok((bytes, kind))
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, IoErrorKind};

    #[tokio::test]
    async fn loopback_round_trips_rtp_and_rtcp() {
        let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let no_deadline = Duration::from_secs(5);

        let a = MuxedTransport::connect("127.0.0.1:0".parse().unwrap(), "127.0.0.1:0".parse().unwrap(), 1500)
            .await
            .unwrap();
        let a_addr = a.socket.local_addr().unwrap();

        let b = MuxedTransport::connect("127.0.0.1:0".parse().unwrap(), a_addr, 1500)
            .await
            .unwrap();
        let b_addr = b.socket.local_addr().unwrap();
        a.socket.connect(b_addr).await.unwrap();

        let rtp_packet = [0x80u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        a.send_rtp(&rtp_packet).await.unwrap();
        let (bytes, kind) = b.recv(no_deadline, &cancel_rx).await.unwrap();
        assert_eq!(kind, PacketKind::Rtp);
        assert_eq!(&bytes[..], &rtp_packet[..]);

        let rtcp_packet = [0x80u8, 200, 0, 1, 0, 0, 0, 0];
        a.send_rtcp(&rtcp_packet).await.unwrap();
        let (bytes, kind) = b.recv(no_deadline, &cancel_rx).await.unwrap();
        assert_eq!(kind, PacketKind::Rtcp);
        assert_eq!(&bytes[..], &rtcp_packet[..]);
    }

    #[tokio::test]
    async fn recv_times_out_when_nothing_arrives() {
        let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let a = MuxedTransport::connect("127.0.0.1:0".parse().unwrap(), "127.0.0.1:0".parse().unwrap(), 1500)
            .await
            .unwrap();

        let err = a.recv(Duration::from_millis(20), &cancel_rx).await.unwrap_err();
        assert!(matches!(
            err,
            Error::TransportIo { kind: IoErrorKind::Timeout, .. }
        ));
    }

    #[tokio::test]
    async fn recv_yields_cancelled_once_signalled() {
        let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let a = MuxedTransport::connect("127.0.0.1:0".parse().unwrap(), "127.0.0.1:0".parse().unwrap(), 1500)
            .await
            .unwrap();

        cancel_tx.send(true).unwrap();
        let err = a.recv(Duration::from_secs(5), &cancel_rx).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
