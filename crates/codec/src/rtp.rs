//! RTP header encode/decode.
//!
//! [rfc3550 §5.1](https://datatracker.ietf.org/doc/html/rfc3550#section-5.1):
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       sequence number        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           synchronization source (SSRC) identifier            |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |            contributing source (CSRC) identifiers             |
//! |                             ....                               |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result, MAX_PACKET_SIZE, RTP_MIN_SIZE};

/// A decoded RTP header, independent of the payload bytes that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    /// Encoded size of this header in bytes, including any CSRC list.
    pub fn header_len(&self, csrc_count: usize) -> usize {
        RTP_MIN_SIZE + csrc_count * 4
    }
}

/// A decoded RTP packet borrowing its payload from the buffer it was parsed
/// out of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet<'a> {
    pub header: RtpHeader,
    pub csrc: Vec<u32>,
    pub payload: &'a [u8],
}

impl<'a> Packet<'a> {
    /// Copies this packet's payload into an owned buffer, detaching it from
    /// the lifetime of the datagram it was decoded from.
    pub fn to_owned_payload(&self) -> Bytes {
        Bytes::copy_from_slice(self.payload)
    }
}

/// Encodes an RTP header plus payload into a fresh buffer.
///
/// Fails with [`Error::SizeOutOfRange`] if the encoded packet would fall
/// outside `[RTP_MIN_SIZE, MAX_PACKET_SIZE]`, and with
/// [`Error::PayloadTypeInvalid`] if `header.payload_type` has the high bit
/// set.
///
/// ```
/// use rtp_session_codec::rtp::{encode_rtp, decode_rtp, RtpHeader};
///
/// let header = RtpHeader {
///     padding: false,
///     extension: false,
///     marker: true,
///     payload_type: 0,
///     sequence_number: 1,
///     timestamp: 160,
///     ssrc: 0xdead_beef,
/// };
///
/// let bytes = encode_rtp(&header, &[], &[0xaa; 160]).unwrap();
/// let packet = decode_rtp(&bytes).unwrap();
/// assert_eq!(packet.header, header);
/// assert_eq!(packet.payload, &[0xaa; 160][..]);
/// ```
pub fn encode_rtp(header: &RtpHeader, csrc: &[u32], payload: &[u8]) -> Result<Bytes> {
    if header.payload_type > 0x7f {
        return Err(Error::PayloadTypeInvalid);
    }
    if csrc.len() > 0x0f {
        return Err(Error::MalformedHeader);
    }

    let size = header.header_len(csrc.len()) + payload.len();
    if !(RTP_MIN_SIZE..=MAX_PACKET_SIZE).contains(&size) {
        return Err(Error::SizeOutOfRange);
    }

    let mut buf = BytesMut::with_capacity(size);

    let mut byte0 = 0x80u8; // version 2
    if header.padding {
        byte0 |= 0x20;
    }
    if header.extension {
        byte0 |= 0x10;
    }
    byte0 |= csrc.len() as u8 & 0x0f;
    buf.put_u8(byte0);

    let mut byte1 = header.payload_type & 0x7f;
    if header.marker {
        byte1 |= 0x80;
    }
    buf.put_u8(byte1);

    buf.put_u16(header.sequence_number);
    buf.put_u32(header.timestamp);
    buf.put_u32(header.ssrc);
    for id in csrc {
        buf.put_u32(*id);
    }
    buf.put_slice(payload);

    Ok(buf.freeze())
}

/// Decodes an RTP packet, validating version, size bounds, and CSRC count.
///
/// ```
/// use rtp_session_codec::rtp::decode_rtp;
///
/// assert!(decode_rtp(&[0u8; 4]).is_err());
/// ```
pub fn decode_rtp(bytes: &[u8]) -> Result<Packet<'_>> {
    if bytes.len() < RTP_MIN_SIZE {
        return Err(Error::SizeOutOfRange);
    }
    if bytes.len() > MAX_PACKET_SIZE {
        return Err(Error::SizeOutOfRange);
    }

    let version = bytes[0] >> 6;
    if version != 2 {
        return Err(Error::UnsupportedVersion);
    }

    let padding = bytes[0] & 0x20 != 0;
    let extension = bytes[0] & 0x10 != 0;
    let csrc_count = (bytes[0] & 0x0f) as usize;

    let marker = bytes[1] & 0x80 != 0;
    let payload_type = bytes[1] & 0x7f;

    let sequence_number = u16::from_be_bytes(bytes[2..4].try_into()?);
    let timestamp = u32::from_be_bytes(bytes[4..8].try_into()?);
    let ssrc = u32::from_be_bytes(bytes[8..12].try_into()?);

    let header_len = RTP_MIN_SIZE + csrc_count * 4;
    if bytes.len() < header_len {
        return Err(Error::MalformedHeader);
    }

    let mut csrc = Vec::with_capacity(csrc_count);
    for i in 0..csrc_count {
        let off = RTP_MIN_SIZE + i * 4;
        csrc.push(u32::from_be_bytes(bytes[off..off + 4].try_into()?));
    }

    let mut payload_start = header_len;
    // Header extension (rfc3550 §5.3.1): a 16 bit profile-defined identifier
    // followed by a 16 bit length in 32 bit words, then that many words.
    if extension {
        if bytes.len() < payload_start + 4 {
            return Err(Error::MalformedHeader);
        }
        let ext_len_words =
            u16::from_be_bytes(bytes[payload_start + 2..payload_start + 4].try_into()?) as usize;
        payload_start += 4 + ext_len_words * 4;
        if bytes.len() < payload_start {
            return Err(Error::MalformedHeader);
        }
    }

    let mut payload_end = bytes.len();
    if padding {
        let pad_len = *bytes.last().ok_or(Error::MalformedHeader)? as usize;
        if pad_len == 0 || pad_len > payload_end - payload_start {
            return Err(Error::MalformedHeader);
        }
        payload_end -= pad_len;
    }

    Ok(Packet {
        header: RtpHeader {
            padding,
            extension,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
        },
        csrc,
        payload: &bytes[payload_start..payload_end],
    })
}

/// RFC 3551 audio payload types relevant to this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioPayloadType {
    Pcmu,
    Gsm,
    Pcma,
    G722,
    G728,
    G729,
    /// A dynamically negotiated type (96..=127), opaque to this crate.
    Dynamic(u8),
}

impl AudioPayloadType {
    /// Static RTP payload type number, per rfc3551 table 4.
    pub fn number(&self) -> u8 {
        match self {
            Self::Pcmu => 0,
            Self::Gsm => 3,
            Self::Pcma => 8,
            Self::G722 => 9,
            Self::G728 => 15,
            Self::G729 => 18,
            Self::Dynamic(n) => *n,
        }
    }

    /// RTP clock rate in Hz. Note the rfc3551 §4.5.2 exception: G.722 samples
    /// audio at 16 kHz but its RTP clock runs at 8000 Hz for historical
    /// reasons.
    pub fn clock_rate(&self) -> u32 {
        match self {
            Self::Pcmu | Self::Gsm | Self::Pcma | Self::G722 | Self::G728 | Self::G729 => 8000,
            Self::Dynamic(_) => 8000,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::Pcmu),
            3 => Some(Self::Gsm),
            8 => Some(Self::Pcma),
            9 => Some(Self::G722),
            15 => Some(Self::G728),
            18 => Some(Self::G729),
            96..=127 => Some(Self::Dynamic(n)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> RtpHeader {
        RtpHeader {
            padding: false,
            extension: false,
            marker: false,
            payload_type: 0,
            sequence_number: 42,
            timestamp: 12345,
            ssrc: 0x1234_5678,
        }
    }

    #[test]
    fn round_trips_without_csrc() {
        let bytes = encode_rtp(&header(), &[], b"hello").unwrap();
        let packet = decode_rtp(&bytes).unwrap();
        assert_eq!(packet.header, header());
        assert_eq!(packet.payload, b"hello");
        assert!(packet.csrc.is_empty());
    }

    #[test]
    fn round_trips_with_csrc() {
        let bytes = encode_rtp(&header(), &[1, 2, 3], b"hi").unwrap();
        let packet = decode_rtp(&bytes).unwrap();
        assert_eq!(packet.csrc, vec![1, 2, 3]);
        assert_eq!(packet.payload, b"hi");
    }

    #[test]
    fn rejects_bad_version() {
        let mut bytes = encode_rtp(&header(), &[], b"x").unwrap().to_vec();
        bytes[0] = (bytes[0] & 0x3f) | (1 << 6);
        assert!(matches!(decode_rtp(&bytes), Err(Error::UnsupportedVersion)));
    }

    #[test]
    fn rejects_undersize() {
        assert!(matches!(decode_rtp(&[0u8; 4]), Err(Error::SizeOutOfRange)));
    }

    #[test]
    fn rejects_invalid_payload_type() {
        let mut h = header();
        h.payload_type = 0xff;
        assert!(matches!(
            encode_rtp(&h, &[], b""),
            Err(Error::PayloadTypeInvalid)
        ));
    }

    #[test]
    fn strips_padding() {
        let mut bytes = encode_rtp(&header(), &[], b"hello").unwrap().to_vec();
        bytes[0] |= 0x20; // padding bit
        bytes.extend_from_slice(&[0, 0, 3]); // 3 bytes of padding, last = count
        let packet = decode_rtp(&bytes).unwrap();
        assert_eq!(packet.payload, b"hello");
    }

    #[test]
    fn payload_type_round_trips() {
        for pt in [0u8, 3, 8, 9, 15, 18, 96, 127] {
            let apt = AudioPayloadType::from_number(pt).unwrap();
            assert_eq!(apt.number(), pt);
        }
        assert!(AudioPayloadType::from_number(200).is_none());
    }
}
