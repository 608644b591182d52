use codec::{
    rtcp::encode_compound,
    rtp::{decode_rtp, encode_rtp, RtpHeader},
};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use service::{
    rtcp::{compose_compound, SenderInfo},
    source::{SourceTracker, SourceTrackerConfig},
};

fn criterion_benchmark(c: &mut Criterion) {
    let header = RtpHeader {
        padding: false,
        extension: false,
        marker: false,
        payload_type: 0,
        sequence_number: 1,
        timestamp: 160,
        ssrc: 0xdead_beef,
    };
    let payload = [0xaa; 160];
    let encoded = encode_rtp(&header, &[], &payload).unwrap();

    let mut group = c.benchmark_group("rtp_session");
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("rtp_encode", |b| {
        b.iter(|| encode_rtp(&header, &[], &payload).unwrap());
    });

    group.bench_function("rtp_decode", |b| {
        b.iter(|| decode_rtp(&encoded).unwrap());
    });

    group.bench_function("source_tracker_update", |b| {
        let tracker = SourceTracker::new(SourceTrackerConfig::default(), ());
        let mut header = header.clone();
        b.iter(|| {
            header.sequence_number = header.sequence_number.wrapping_add(1);
            let packet = decode_rtp(&encode_rtp(&header, &[], &payload).unwrap()).unwrap();
            tracker.update_from_packet(&packet);
        });
        tracker.stop();
    });

    group.bench_function("rtcp_compose_and_encode", |b| {
        b.iter(|| {
            let packets = compose_compound(
                0xdead_beef,
                Some(SenderInfo {
                    ntp_time: codec::ntp::NtpTimestamp::from_system_time(std::time::SystemTime::now()),
                    rtp_timestamp: 160,
                    packet_count: 1,
                    octet_count: 160,
                }),
                vec![],
                "user@host".to_string(),
            );
            encode_compound(&packets).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
