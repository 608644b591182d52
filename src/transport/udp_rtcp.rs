//! Two UDP sockets, one for RTP and one for RTCP, the classic rfc3550
//! layout where RTCP traditionally lives on the next higher port.

use std::{net::SocketAddr, sync::Arc};

use bytes::{Bytes, BytesMut};
use tokio::{net::UdpSocket as TokioUdpSocket, time::Duration};

use crate::{
    error::{Error, IoErrorKind, Result},
    transport::{CancelSignal, PacketKind, Transport},
};

pub struct UdpRtcpTransport {
    rtp: Arc<TokioUdpSocket>,
    rtcp: Arc<TokioUdpSocket>,
    peer_rtp: SocketAddr,
    mtu: usize,
}

impl UdpRtcpTransport {
    pub async fn connect(
        rtp_listen: SocketAddr,
        rtcp_listen: SocketAddr,
        peer_rtp: SocketAddr,
        peer_rtcp: SocketAddr,
        mtu: usize,
    ) -> Result<Self> {
        let rtp = TokioUdpSocket::bind(rtp_listen).await?;
        rtp.connect(peer_rtp).await?;

        let rtcp = TokioUdpSocket::bind(rtcp_listen).await?;
        rtcp.connect(peer_rtcp).await?;

        Ok(Self {
            rtp: Arc::new(rtp),
            rtcp: Arc::new(rtcp),
            peer_rtp,
            mtu,
        })
    }
}

impl Transport for UdpRtcpTransport {
    async fn send_rtp(&self, buf: &[u8]) -> Result<()> {
        self.rtp.send(buf).await?;
        Ok(())
    }

    async fn send_rtcp(&self, buf: &[u8]) -> Result<()> {
        self.rtcp.send(buf).await?;
        Ok(())
    }

    async fn recv(&self, deadline: Duration, cancel: &CancelSignal) -> Result<(Bytes, PacketKind)> {
        let mut rtp_buf = BytesMut::zeroed(self.mtu);
        let mut rtcp_buf = BytesMut::zeroed(self.mtu);
        let mut cancel = cancel.clone();

        tokio::select! {
            result = self.rtp.recv(&mut rtp_buf) => {
                let size = result?;
                rtp_buf.truncate(size);
                Ok((rtp_buf.freeze(), PacketKind::Rtp))
            }
            result = self.rtcp.recv(&mut rtcp_buf) => {
                let size = result?;
                rtcp_buf.truncate(size);
                Ok((rtcp_buf.freeze(), PacketKind::Rtcp))
            }
            _ = tokio::time::sleep(deadline) => Err(Error::TransportIo {
                kind: IoErrorKind::Timeout,
                source: std::io::Error::from(std::io::ErrorKind::TimedOut),
            }),
            _ = cancel.changed() => Err(Error::Cancelled),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer_rtp
    }
}
