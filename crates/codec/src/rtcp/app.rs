//! Application-defined. [rfc3550 §6.7](https://datatracker.ietf.org/doc/html/rfc3550#section-6.7)
//!
//! Parsed and passed through to the caller unchanged; this engine assigns no
//! meaning to any subtype or name (see the root crate's `Non-goals`).

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    rtcp::{alignment_32, RtcpHeader, PT_APP},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub subtype: u8,
    pub ssrc: u32,
    pub name: [u8; 4],
    pub data: Bytes,
}

pub(crate) fn decode(bytes: &[u8], header: &RtcpHeader) -> Result<App> {
    if bytes.len() < 12 {
        return Err(Error::MalformedHeader);
    }
    let ssrc = u32::from_be_bytes(bytes[4..8].try_into()?);
    let name: [u8; 4] = bytes[8..12].try_into()?;
    let data = Bytes::copy_from_slice(&bytes[12..]);

    Ok(App { subtype: header.count, ssrc, name, data })
}

pub(crate) fn encode(app: &App, buf: &mut BytesMut) -> Result<()> {
    if app.subtype > 0x1f {
        return Err(Error::MalformedHeader);
    }

    let padded_len = app.data.len() + alignment_32(app.data.len());
    let words = (12 + padded_len) / 4 - 1;
    let header = RtcpHeader {
        padding: false,
        count: app.subtype,
        packet_type: PT_APP,
        length: words as u16,
    };
    header.encode(buf);
    buf.put_u32(app.ssrc);
    buf.put_slice(&app.name);
    buf.put_slice(&app.data);
    for _ in 0..alignment_32(app.data.len()) {
        buf.put_u8(0);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let app = App {
            subtype: 1,
            ssrc: 0x1234,
            name: *b"test",
            data: Bytes::from_static(b"hello!"),
        };
        let mut buf = BytesMut::new();
        encode(&app, &mut buf).unwrap();
        assert_eq!(buf.len() % 4, 0);
        let header = RtcpHeader::decode(&buf).unwrap();
        assert_eq!(decode(&buf, &header).unwrap(), app);
    }
}
