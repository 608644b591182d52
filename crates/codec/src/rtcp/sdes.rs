//! Source Description. [rfc3550 §6.5](https://datatracker.ietf.org/doc/html/rfc3550#section-6.5)
//!
//! Each chunk is an SSRC followed by a list of `(type, length, text)`
//! items, terminated by a zero type octet, and the whole chunk padded to a
//! 32 bit boundary.

use bytes::{BufMut, BytesMut};

use crate::{
    rtcp::{alignment_32, RtcpHeader, PT_SDES},
    Error, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdesItemType {
    Cname,
    Name,
    Email,
    Phone,
    Loc,
    Tool,
    Note,
    Priv,
}

impl SdesItemType {
    fn code(self) -> u8 {
        match self {
            Self::Cname => 1,
            Self::Name => 2,
            Self::Email => 3,
            Self::Phone => 4,
            Self::Loc => 5,
            Self::Tool => 6,
            Self::Note => 7,
            Self::Priv => 8,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Cname),
            2 => Some(Self::Name),
            3 => Some(Self::Email),
            4 => Some(Self::Phone),
            5 => Some(Self::Loc),
            6 => Some(Self::Tool),
            7 => Some(Self::Note),
            8 => Some(Self::Priv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdesItem {
    pub kind: SdesItemType,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdesChunk {
    pub ssrc: u32,
    pub items: Vec<SdesItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceDescription {
    pub chunks: Vec<SdesChunk>,
}

pub(crate) fn decode(bytes: &[u8], header: &RtcpHeader) -> Result<SourceDescription> {
    let mut chunks = Vec::with_capacity(header.count as usize);
    let mut offset = 4;

    for _ in 0..header.count {
        if bytes.len() < offset + 4 {
            return Err(Error::MalformedHeader);
        }
        let chunk_start = offset;
        let ssrc = u32::from_be_bytes(bytes[offset..offset + 4].try_into()?);
        offset += 4;

        let mut items = Vec::new();
        loop {
            if offset >= bytes.len() {
                return Err(Error::MalformedHeader);
            }
            let item_type = bytes[offset];
            offset += 1;
            if item_type == 0 {
                break;
            }
            if offset >= bytes.len() {
                return Err(Error::MalformedHeader);
            }
            let len = bytes[offset] as usize;
            offset += 1;
            if bytes.len() < offset + len {
                return Err(Error::MalformedHeader);
            }
            let text = std::str::from_utf8(&bytes[offset..offset + len])?.to_owned();
            offset += len;

            if let Some(kind) = SdesItemType::from_code(item_type) {
                items.push(SdesItem { kind, text });
            }
        }

        let consumed = offset - chunk_start;
        offset += alignment_32(consumed);
        chunks.push(SdesChunk { ssrc, items });
    }

    Ok(SourceDescription { chunks })
}

pub(crate) fn encode(sdes: &SourceDescription, buf: &mut BytesMut) -> Result<()> {
    if sdes.chunks.len() > 0x1f {
        return Err(Error::MalformedHeader);
    }

    let mut body = BytesMut::new();
    for chunk in &sdes.chunks {
        let chunk_start = body.len();
        body.put_u32(chunk.ssrc);
        for item in &chunk.items {
            if item.text.len() > 0xff {
                return Err(Error::MalformedHeader);
            }
            body.put_u8(item.kind.code());
            body.put_u8(item.text.len() as u8);
            body.put_slice(item.text.as_bytes());
        }
        body.put_u8(0); // terminator

        let consumed = body.len() - chunk_start;
        for _ in 0..alignment_32(consumed) {
            body.put_u8(0);
        }
    }

    let words = (4 + body.len()) / 4 - 1;
    let header = RtcpHeader {
        padding: false,
        count: sdes.chunks.len() as u8,
        packet_type: PT_SDES,
        length: words as u16,
    };
    header.encode(buf);
    buf.put_slice(&body);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_cname_only() {
        let sdes = SourceDescription {
            chunks: vec![SdesChunk {
                ssrc: 42,
                items: vec![SdesItem {
                    kind: SdesItemType::Cname,
                    text: "alice@example.com".into(),
                }],
            }],
        };
        let mut buf = BytesMut::new();
        encode(&sdes, &mut buf).unwrap();
        let header = RtcpHeader::decode(&buf).unwrap();
        let decoded = decode(&buf, &header).unwrap();
        assert_eq!(decoded, sdes);
    }

    #[test]
    fn round_trips_multiple_chunks_and_items() {
        let sdes = SourceDescription {
            chunks: vec![
                SdesChunk {
                    ssrc: 1,
                    items: vec![
                        SdesItem { kind: SdesItemType::Cname, text: "a".into() },
                        SdesItem { kind: SdesItemType::Tool, text: "rtp-session".into() },
                    ],
                },
                SdesChunk {
                    ssrc: 2,
                    items: vec![SdesItem { kind: SdesItemType::Cname, text: "bb".into() }],
                },
            ],
        };
        let mut buf = BytesMut::new();
        encode(&sdes, &mut buf).unwrap();
        assert_eq!(buf.len() % 4, 0);
        let header = RtcpHeader::decode(&buf).unwrap();
        let decoded = decode(&buf, &header).unwrap();
        assert_eq!(decoded, sdes);
    }
}
