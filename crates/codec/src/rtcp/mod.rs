//! RTCP compound packet encode/decode.
//!
//! [rfc3550 §6.4](https://datatracker.ietf.org/doc/html/rfc3550#section-6.4)
//! (SR/RR), [§6.5](https://datatracker.ietf.org/doc/html/rfc3550#section-6.5)
//! (SDES). A compound packet is simply a back-to-back sequence of
//! sub-packets, each self-describing its own length in 32 bit words.

pub mod app;
pub mod bye;
pub mod report;
pub mod rr;
pub mod sdes;
pub mod sr;

pub use app::App;
pub use bye::Bye;
pub use report::ReceptionReportBlock;
pub use rr::ReceiverReport;
pub use sdes::{SdesChunk, SdesItem, SourceDescription};
pub use sr::SenderReport;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

pub const PT_SR: u8 = 200;
pub const PT_RR: u8 = 201;
pub const PT_SDES: u8 = 202;
pub const PT_BYE: u8 = 203;
pub const PT_APP: u8 = 204;

/// Rounds `size` up to the next multiple of 4, returning the number of
/// padding bytes needed, not the rounded size itself.
///
/// ```
/// use rtp_session_codec::rtcp::alignment_32;
///
/// assert_eq!(alignment_32(4), 0);
/// assert_eq!(alignment_32(0), 0);
/// assert_eq!(alignment_32(5), 3);
/// ```
pub fn alignment_32(size: usize) -> usize {
    (4 - size % 4) % 4
}

/// Common first word of every RTCP sub-packet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RtcpHeader {
    pub padding: bool,
    pub count: u8,
    pub packet_type: u8,
    /// Length of the sub-packet in 32 bit words, minus one, including this header.
    pub length: u16,
}

impl RtcpHeader {
    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(Error::SizeOutOfRange);
        }
        let version = bytes[0] >> 6;
        if version != 2 {
            return Err(Error::UnsupportedVersion);
        }
        Ok(Self {
            padding: bytes[0] & 0x20 != 0,
            count: bytes[0] & 0x1f,
            packet_type: bytes[1],
            length: u16::from_be_bytes([bytes[2], bytes[3]]),
        })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        let mut byte0 = 0x80u8;
        if self.padding {
            byte0 |= 0x20;
        }
        byte0 |= self.count & 0x1f;
        buf.put_u8(byte0);
        buf.put_u8(self.packet_type);
        buf.put_u16(self.length);
    }

    /// Size in bytes implied by `length`, including this 4 byte header.
    pub(crate) fn byte_len(&self) -> usize {
        (self.length as usize + 1) * 4
    }
}

/// A single decoded RTCP sub-packet.
#[derive(Debug, Clone)]
pub enum Packet {
    SenderReport(SenderReport),
    ReceiverReport(ReceiverReport),
    SourceDescription(SourceDescription),
    Bye(Bye),
    App(App),
}

/// Decodes every sub-packet out of an RTCP compound packet.
///
/// Unknown packet types within the compound are skipped using their declared
/// length, rather than aborting the whole decode, since rfc3550 §6.1 allows
/// extension packet types to appear in a compound packet.
///
/// ```
/// use rtp_session_codec::rtcp::{decode_compound, encode_compound, Packet, Bye};
///
/// let bye = Bye { sources: vec![1, 2], reason: None };
/// let bytes = encode_compound(&[Packet::Bye(bye.clone())]).unwrap();
/// let decoded = decode_compound(&bytes).unwrap();
/// assert_eq!(decoded.len(), 1);
/// assert!(matches!(&decoded[0], Packet::Bye(b) if b.sources == bye.sources));
/// ```
pub fn decode_compound(bytes: &[u8]) -> Result<Vec<Packet>> {
    let mut out = Vec::new();
    let mut rest = bytes;

    while !rest.is_empty() {
        let header = RtcpHeader::decode(rest)?;
        let total = header.byte_len();
        if total < 4 || total > rest.len() {
            return Err(Error::MalformedHeader);
        }
        let chunk = &rest[..total];

        match header.packet_type {
            PT_SR => out.push(Packet::SenderReport(sr::decode(chunk, &header)?)),
            PT_RR => out.push(Packet::ReceiverReport(rr::decode(chunk, &header)?)),
            PT_SDES => out.push(Packet::SourceDescription(sdes::decode(chunk, &header)?)),
            PT_BYE => out.push(Packet::Bye(bye::decode(chunk, &header)?)),
            PT_APP => out.push(Packet::App(app::decode(chunk, &header)?)),
            _ => {}
        }

        rest = &rest[total..];
    }

    Ok(out)
}

/// Encodes a sequence of sub-packets into one compound buffer.
pub fn encode_compound(packets: &[Packet]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(256);
    for packet in packets {
        match packet {
            Packet::SenderReport(p) => sr::encode(p, &mut buf)?,
            Packet::ReceiverReport(p) => rr::encode(p, &mut buf)?,
            Packet::SourceDescription(p) => sdes::encode(p, &mut buf)?,
            Packet::Bye(p) => bye::encode(p, &mut buf)?,
            Packet::App(p) => app::encode(p, &mut buf)?,
        }
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_covers_all_remainders() {
        assert_eq!(alignment_32(1), 3);
        assert_eq!(alignment_32(2), 2);
        assert_eq!(alignment_32(3), 1);
    }

    #[test]
    fn unknown_packet_type_is_skipped_not_fatal() {
        // A single 8-byte sub-packet of an unregistered type (199) with
        // length=1 (2 words = 8 bytes) followed by a real BYE.
        let mut buf = BytesMut::new();
        buf.put_u8(0x80);
        buf.put_u8(199);
        buf.put_u16(1);
        buf.put_u32(0);

        let bye = Packet::Bye(Bye { sources: vec![7], reason: None });
        let bye_bytes = encode_compound(&[bye]).unwrap();
        buf.extend_from_slice(&bye_bytes);

        let decoded = decode_compound(&buf).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(matches!(&decoded[0], Packet::Bye(b) if b.sources == vec![7]));
    }
}
