//! Receiver Report. [rfc3550 §6.4.2](https://datatracker.ietf.org/doc/html/rfc3550#section-6.4.2)
//!
//! Identical to a Sender Report minus the five sender-info words.

use bytes::{BufMut, BytesMut};

use crate::{
    rtcp::{report, report::ReceptionReportBlock, RtcpHeader, PT_RR},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverReport {
    pub ssrc: u32,
    pub reports: Vec<ReceptionReportBlock>,
}

pub(crate) fn decode(bytes: &[u8], header: &RtcpHeader) -> Result<ReceiverReport> {
    if bytes.len() < 8 {
        return Err(Error::MalformedHeader);
    }
    let ssrc = u32::from_be_bytes(bytes[4..8].try_into()?);

    let mut reports = Vec::with_capacity(header.count as usize);
    let mut offset = 8;
    for _ in 0..header.count {
        if bytes.len() < offset + report::ENCODED_LEN {
            return Err(Error::MalformedHeader);
        }
        reports.push(ReceptionReportBlock::decode(
            &bytes[offset..offset + report::ENCODED_LEN],
        )?);
        offset += report::ENCODED_LEN;
    }

    Ok(ReceiverReport { ssrc, reports })
}

pub(crate) fn encode(rr: &ReceiverReport, buf: &mut BytesMut) -> Result<()> {
    if rr.reports.len() > 0x1f {
        return Err(Error::MalformedHeader);
    }

    let words = (8 + rr.reports.len() * report::ENCODED_LEN) / 4 - 1;
    let header = RtcpHeader {
        padding: false,
        count: rr.reports.len() as u8,
        packet_type: PT_RR,
        length: words as u16,
    };
    header.encode(buf);
    buf.put_u32(rr.ssrc);

    for report in &rr.reports {
        report.encode(buf);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_no_reports() {
        let rr = ReceiverReport { ssrc: 1, reports: vec![] };
        let mut buf = BytesMut::new();
        encode(&rr, &mut buf).unwrap();
        let header = RtcpHeader::decode(&buf).unwrap();
        assert_eq!(decode(&buf, &header).unwrap(), rr);
    }

    #[test]
    fn round_trips_with_reports() {
        let rr = ReceiverReport {
            ssrc: 1,
            reports: vec![ReceptionReportBlock {
                ssrc: 2,
                fraction_lost: 5,
                cumulative_lost: 10,
                extended_highest_sequence: 20,
                jitter: 3,
                last_sr: 0,
                delay_since_last_sr: 0,
            }],
        };
        let mut buf = BytesMut::new();
        encode(&rr, &mut buf).unwrap();
        let header = RtcpHeader::decode(&buf).unwrap();
        assert_eq!(decode(&buf, &header).unwrap(), rr);
    }
}
