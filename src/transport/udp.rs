//! A single UDP socket carrying RTP only, for peers that never send RTCP.

use std::{net::SocketAddr, sync::Arc};

use bytes::{Bytes, BytesMut};
use tokio::{net::UdpSocket as TokioUdpSocket, time::Duration};

use crate::{
    error::{Error, Result},
    transport::{race_deadline, CancelSignal, PacketKind, Transport},
};

pub struct UdpTransport {
    socket: Arc<TokioUdpSocket>,
    peer: SocketAddr,
    mtu: usize,
}

impl UdpTransport {
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

impl Transport for UdpTransport {
    async fn send_rtp(&self, buf: &[u8]) -> Result<()> {
        self.socket.send(buf).await?;
        Ok(())
    }

    async fn send_rtcp(&self, _buf: &[u8]) -> Result<()> {
        Err(Error::ConfigInvalid(
            "udp-only transport has no rtcp channel".into(),
        ))
    }

    async fn recv(&self, deadline: Duration, cancel: &CancelSignal) -> Result<(Bytes, PacketKind)> {
        let mut buffer = BytesMut::zeroed(self.mtu);
        let size = race_deadline(deadline, cancel, self.socket.recv(&mut buffer)).await?;
        buffer.truncate(size);
        Ok((buffer.freeze(), PacketKind::Rtp))
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
