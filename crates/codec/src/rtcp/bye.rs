//! Goodbye. [rfc3550 §6.6](https://datatracker.ietf.org/doc/html/rfc3550#section-6.6)
//!
//! This engine only parses BYE far enough to hand it to the caller; it never
//! synthesizes session teardown from it (see the root crate's `Non-goals`).

use bytes::{BufMut, BytesMut};

use crate::{
    rtcp::{alignment_32, RtcpHeader, PT_BYE},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bye {
    pub sources: Vec<u32>,
    pub reason: Option<String>,
}

pub(crate) fn decode(bytes: &[u8], header: &RtcpHeader) -> Result<Bye> {
    let mut sources = Vec::with_capacity(header.count as usize);
    let mut offset = 4;
    for _ in 0..header.count {
        if bytes.len() < offset + 4 {
            return Err(Error::MalformedHeader);
        }
        sources.push(u32::from_be_bytes(bytes[offset..offset + 4].try_into()?));
        offset += 4;
    }

    let reason = if offset < bytes.len() {
        let len = bytes[offset] as usize;
        offset += 1;
        if bytes.len() < offset + len {
            return Err(Error::MalformedHeader);
        }
        Some(std::str::from_utf8(&bytes[offset..offset + len])?.to_owned())
    } else {
        None
    };

    Ok(Bye { sources, reason })
}

pub(crate) fn encode(bye: &Bye, buf: &mut BytesMut) -> Result<()> {
    if bye.sources.len() > 0x1f {
        return Err(Error::MalformedHeader);
    }

    let mut body = BytesMut::new();
    for ssrc in &bye.sources {
        body.put_u32(*ssrc);
    }
    if let Some(reason) = &bye.reason {
        if reason.len() > 0xff {
            return Err(Error::MalformedHeader);
        }
        body.put_u8(reason.len() as u8);
        body.put_slice(reason.as_bytes());
        for _ in 0..alignment_32(body.len()) {
            body.put_u8(0);
        }
    }

    let words = (4 + body.len()) / 4 - 1;
    let header = RtcpHeader {
        padding: false,
        count: bye.sources.len() as u8,
        packet_type: PT_BYE,
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
    fn round_trips_without_reason() {
        let bye = Bye { sources: vec![1, 2, 3], reason: None };
        let mut buf = BytesMut::new();
        encode(&bye, &mut buf).unwrap();
        let header = RtcpHeader::decode(&buf).unwrap();
        assert_eq!(decode(&buf, &header).unwrap(), bye);
    }

    #[test]
    fn round_trips_with_reason() {
        let bye = Bye { sources: vec![9], reason: Some("done".into()) };
        let mut buf = BytesMut::new();
        encode(&bye, &mut buf).unwrap();
        assert_eq!(buf.len() % 4, 0);
        let header = RtcpHeader::decode(&buf).unwrap();
        assert_eq!(decode(&buf, &header).unwrap(), bye);
    }
}
