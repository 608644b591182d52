//! Sender Report. [rfc3550 §6.4.1](https://datatracker.ietf.org/doc/html/rfc3550#section-6.4.1)
//!
//! ```text
//!  0                   1                   2                   3
//! header |V=2|P|    RC   |   PT=SR=200   |             length            |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                         SSRC of sender                        |
//! sender +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! info   |              NTP timestamp, most significant word             |
//!        |             NTP timestamp, least significant word             |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                         RTP timestamp                         |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                     sender's packet count                     |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                      sender's octet count                     |
//!        +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//!        |                 SSRC_1 (report block 1) ...                   |
//! ```

use bytes::{BufMut, BytesMut};

use crate::{
    ntp::NtpTimestamp,
    rtcp::{report, report::ReceptionReportBlock, RtcpHeader, PT_SR},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderReport {
    pub ssrc: u32,
    pub ntp_time: NtpTimestamp,
    pub rtp_timestamp: u32,
    pub packet_count: u32,
    pub octet_count: u32,
    pub reports: Vec<ReceptionReportBlock>,
}

pub(crate) fn decode(bytes: &[u8], header: &RtcpHeader) -> Result<SenderReport> {
    if bytes.len() < 28 {
        return Err(Error::MalformedHeader);
    }

    let ssrc = u32::from_be_bytes(bytes[4..8].try_into()?);
    let ntp_secs = u32::from_be_bytes(bytes[8..12].try_into()?);
    let ntp_frac = u32::from_be_bytes(bytes[12..16].try_into()?);
    let rtp_timestamp = u32::from_be_bytes(bytes[16..20].try_into()?);
    let packet_count = u32::from_be_bytes(bytes[20..24].try_into()?);
    let octet_count = u32::from_be_bytes(bytes[24..28].try_into()?);

    let mut reports = Vec::with_capacity(header.count as usize);
    let mut offset = 28;
    for _ in 0..header.count {
        if bytes.len() < offset + report::ENCODED_LEN {
            return Err(Error::MalformedHeader);
        }
        reports.push(ReceptionReportBlock::decode(
            &bytes[offset..offset + report::ENCODED_LEN],
        )?);
        offset += report::ENCODED_LEN;
    }

    Ok(SenderReport {
        ssrc,
        ntp_time: NtpTimestamp::from_parts(ntp_secs, ntp_frac),
        rtp_timestamp,
        packet_count,
        octet_count,
        reports,
    })
}

pub(crate) fn encode(sr: &SenderReport, buf: &mut BytesMut) -> Result<()> {
    if sr.reports.len() > 0x1f {
        return Err(Error::MalformedHeader);
    }

    let words = (28 + sr.reports.len() * report::ENCODED_LEN) / 4 - 1;
    let header = RtcpHeader {
        padding: false,
        count: sr.reports.len() as u8,
        packet_type: PT_SR,
        length: words as u16,
    };
    header.encode(buf);

    buf.put_u32(sr.ssrc);
    buf.put_u32(sr.ntp_time.seconds());
    buf.put_u32(sr.ntp_time.fraction());
    buf.put_u32(sr.rtp_timestamp);
    buf.put_u32(sr.packet_count);
    buf.put_u32(sr.octet_count);

    for report in &sr.reports {
        report.encode(buf);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SenderReport {
        SenderReport {
            ssrc: 0x1111_2222,
            ntp_time: NtpTimestamp::from_parts(100, 200),
            rtp_timestamp: 9000,
            packet_count: 10,
            octet_count: 1600,
            reports: vec![ReceptionReportBlock {
                ssrc: 0x3333_4444,
                fraction_lost: 0,
                cumulative_lost: 0,
                extended_highest_sequence: 5,
                jitter: 1,
                last_sr: 0,
                delay_since_last_sr: 0,
            }],
        }
    }

    #[test]
    fn round_trips() {
        let mut buf = BytesMut::new();
        let sr = sample();
        encode(&sr, &mut buf).unwrap();
        let header = RtcpHeader::decode(&buf).unwrap();
        let decoded = decode(&buf, &header).unwrap();
        assert_eq!(decoded, sr);
    }

    #[test]
    fn empty_reports_still_encode() {
        let mut sr = sample();
        sr.reports.clear();
        let mut buf = BytesMut::new();
        encode(&sr, &mut buf).unwrap();
        let header = RtcpHeader::decode(&buf).unwrap();
        assert_eq!(header.count, 0);
        let decoded = decode(&buf, &header).unwrap();
        assert!(decoded.reports.is_empty());
    }
}
