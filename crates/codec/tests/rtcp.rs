use rtp_session_codec::{
    is_rtcp,
    ntp::NtpTimestamp,
    rtcp::{
        decode_compound, encode_compound, Bye, Packet, ReceiverReport, ReceptionReportBlock,
        SdesChunk, SdesItem, SdesItemType, SenderReport, SourceDescription,
    },
};

#[test]
fn compound_sr_sdes_round_trips() -> anyhow::Result<()> {
    let sr = SenderReport {
        ssrc: 0x1111,
        ntp_time: NtpTimestamp::from_parts(3_800_000_000, 0),
        rtp_timestamp: 160_000,
        packet_count: 500,
        octet_count: 80_000,
        reports: vec![ReceptionReportBlock {
            ssrc: 0x2222,
            fraction_lost: 0,
            cumulative_lost: 0,
            extended_highest_sequence: 1000,
            jitter: 5,
            last_sr: 0,
            delay_since_last_sr: 0,
        }],
    };

    let sdes = SourceDescription {
        chunks: vec![SdesChunk {
            ssrc: 0x1111,
            items: vec![SdesItem {
                kind: SdesItemType::Cname,
                text: "caller@example.com".into(),
            }],
        }],
    };

    let bytes = encode_compound(&[Packet::SenderReport(sr.clone()), Packet::SourceDescription(sdes.clone())])?;
    assert!(is_rtcp(&bytes));

    let decoded = decode_compound(&bytes)?;
    assert_eq!(decoded.len(), 2);
    match &decoded[0] {
        Packet::SenderReport(got) => assert_eq!(*got, sr),
        other => panic!("expected SenderReport, got {other:?}"),
    }
    match &decoded[1] {
        Packet::SourceDescription(got) => assert_eq!(*got, sdes),
        other => panic!("expected SourceDescription, got {other:?}"),
    }

    Ok(())
}

#[test]
fn compound_rr_bye_round_trips() -> anyhow::Result<()> {
    let rr = ReceiverReport {
        ssrc: 0xaaaa,
        reports: vec![],
    };
    let bye = Bye {
        sources: vec![0xaaaa],
        reason: Some("session ended".into()),
    };

    let bytes = encode_compound(&[Packet::ReceiverReport(rr.clone()), Packet::Bye(bye.clone())])?;
    let decoded = decode_compound(&bytes)?;

    assert_eq!(decoded.len(), 2);
    match &decoded[0] {
        Packet::ReceiverReport(got) => assert_eq!(*got, rr),
        other => panic!("expected ReceiverReport, got {other:?}"),
    }
    match &decoded[1] {
        Packet::Bye(got) => assert_eq!(*got, bye),
        other => panic!("expected Bye, got {other:?}"),
    }

    Ok(())
}

#[test]
fn is_rtcp_distinguishes_from_rtp() {
    let rtp_bytes = rtp_session_codec::rtp::encode_rtp(
        &rtp_session_codec::rtp::RtpHeader {
            padding: false,
            extension: false,
            marker: false,
            payload_type: 0,
            sequence_number: 1,
            timestamp: 1,
            ssrc: 1,
        },
        &[],
        &[0; 20],
    )
    .unwrap();
    assert!(!is_rtcp(&rtp_bytes));
}
