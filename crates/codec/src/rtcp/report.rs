//! Reception report block, shared by SR and RR.
//!
//! [rfc3550 §6.4.1](https://datatracker.ietf.org/doc/html/rfc3550#section-6.4.1):
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                 SSRC_n (source identifier)                   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | fraction lost |       cumulative number of packets lost      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           extended highest sequence number received           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      interarrival jitter                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         last SR (LSR)                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   delay since last SR (DLSR)                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::{BufMut, BytesMut};

use crate::{math, Error, Result};

pub const ENCODED_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceptionReportBlock {
    pub ssrc: u32,
    pub fraction_lost: u8,
    pub cumulative_lost: i64,
    pub extended_highest_sequence: u32,
    pub jitter: u32,
    pub last_sr: u32,
    pub delay_since_last_sr: u32,
}

impl ReceptionReportBlock {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENCODED_LEN {
            return Err(Error::MalformedHeader);
        }
        Ok(Self {
            ssrc: u32::from_be_bytes(bytes[0..4].try_into()?),
            fraction_lost: bytes[4],
            cumulative_lost: math::unpack_cumulative_lost(bytes[5..8].try_into()?),
            extended_highest_sequence: u32::from_be_bytes(bytes[8..12].try_into()?),
            jitter: u32::from_be_bytes(bytes[12..16].try_into()?),
            last_sr: u32::from_be_bytes(bytes[16..20].try_into()?),
            delay_since_last_sr: u32::from_be_bytes(bytes[20..24].try_into()?),
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.ssrc);
        buf.put_u8(self.fraction_lost);
        buf.put_slice(&math::pack_cumulative_lost(self.cumulative_lost));
        buf.put_u32(self.extended_highest_sequence);
        buf.put_u32(self.jitter);
        buf.put_u32(self.last_sr);
        buf.put_u32(self.delay_since_last_sr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let block = ReceptionReportBlock {
            ssrc: 1,
            fraction_lost: 128,
            cumulative_lost: -3,
            extended_highest_sequence: 0x0001_0002,
            jitter: 42,
            last_sr: 0xaabb_ccdd,
            delay_since_last_sr: 500,
        };
        let mut buf = BytesMut::new();
        block.encode(&mut buf);
        assert_eq!(buf.len(), ENCODED_LEN);
        assert_eq!(ReceptionReportBlock::decode(&buf).unwrap(), block);
    }
}
