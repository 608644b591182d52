//! Small numeric helpers shared by the receiver-side and RTCP statistics.

use std::time::Duration;

/// Updates an interarrival jitter estimate per
/// [rfc3550 appendix A.8](https://datatracker.ietf.org/doc/html/rfc3550#appendix-A.8):
///
/// `J ← J + (|D(i-1,i)| - J) / 16`
///
/// where `D` is the difference between relative transit times of the two
/// most recent packets. The caller supplies `transit` already converted to
/// RTP clock units; `jitter` is updated in place.
///
/// ```
/// use rtp_session_codec::math::update_jitter;
///
/// let mut jitter = 0.0;
/// update_jitter(&mut jitter, 100, Some(90));
/// assert_eq!(jitter, (10.0 - 0.0) / 16.0);
/// ```
pub fn update_jitter(jitter: &mut f64, transit: i64, last_transit: Option<i64>) {
    if let Some(last) = last_transit {
        let d = (transit - last).unsigned_abs() as f64;
        *jitter += (d - *jitter) / 16.0;
    }
}

/// Computes the Q.8 fractional-loss byte for an RTCP reception report block
/// (rfc3550 §6.4.1): `clamp((expected - received) * 256 / expected, 0, 255)`,
/// or 0 when nothing was expected.
///
/// ```
/// use rtp_session_codec::math::fraction_lost;
///
/// assert_eq!(fraction_lost(0, 0), 0);
/// assert_eq!(fraction_lost(100, 100), 0);
/// assert_eq!(fraction_lost(100, 50), 128);
/// assert_eq!(fraction_lost(100, 0), 255);
/// ```
pub fn fraction_lost(expected: u64, received: u64) -> u8 {
    if expected == 0 || received >= expected {
        return 0;
    }
    let lost = expected - received;
    let frac = (lost * 256) / expected;
    frac.min(255) as u8
}

/// Packs `cumulative_lost` into the 24-bit signed field used by RTCP
/// reception reports, clamping to the representable range.
pub fn pack_cumulative_lost(cumulative_lost: i64) -> [u8; 3] {
    let clamped = cumulative_lost.clamp(-(1 << 23), (1 << 23) - 1);
    let bytes = (clamped as i32).to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}

/// Round-trip estimate from a reception report block's LSR/DLSR, per
/// [rfc3550 §6.4.1](https://datatracker.ietf.org/doc/html/rfc3550#section-6.4.1):
///
/// `RTT = A - LSR - DLSR`
///
/// where `A` is the arrival time of this report (expressed the same way as
/// `last_sr`: the middle 32 bits of an NTP timestamp, units of 1/65536 s).
/// Returns `None` when `last_sr` is zero, meaning no SR has reached the peer
/// yet and the field carries no timing information.
///
/// ```
/// use rtp_session_codec::math::round_trip_estimate;
///
/// let lsr: u32 = 1_000 << 16;
/// let dlsr: u32 = (1 << 16) / 4; // held onto our SR for 0.25s before replying
/// let rtt_units: u32 = (65536 * 3) / 4; // 0.75s round trip
/// let arrival = lsr.wrapping_add(dlsr).wrapping_add(rtt_units);
/// let rtt = round_trip_estimate(lsr, dlsr, arrival).unwrap();
/// assert!((rtt.as_secs_f64() - 0.75).abs() < 0.001);
/// ```
pub fn round_trip_estimate(last_sr: u32, delay_since_last_sr: u32, arrival_middle32: u32) -> Option<Duration> {
    if last_sr == 0 {
        return None;
    }
    let units = arrival_middle32.wrapping_sub(last_sr).wrapping_sub(delay_since_last_sr);
    Some(Duration::from_secs_f64(units as f64 / 65536.0))
}

/// Unpacks a 24-bit two's-complement signed value.
pub fn unpack_cumulative_lost(bytes: [u8; 3]) -> i64 {
    let mut raw = [0u8; 4];
    raw[1..].copy_from_slice(&bytes);
    let mut value = i32::from_be_bytes(raw);
    if value & 0x0080_0000 != 0 {
        value |= !0x00ff_ffffu32 as i32;
    }
    value as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_ignores_first_sample() {
        let mut jitter = 5.0;
        update_jitter(&mut jitter, 100, None);
        assert_eq!(jitter, 5.0);
    }

    #[test]
    fn round_trip_estimate_none_without_prior_sr() {
        assert!(round_trip_estimate(0, 0, 12345).is_none());
    }

    #[test]
    fn round_trip_estimate_computes_rtt() {
        let lsr: u32 = 500 << 16;
        let dlsr: u32 = 1 << 15; // 0.5s
        let arrival = lsr.wrapping_add(dlsr).wrapping_add(1 << 16); // +1s round trip
        let rtt = round_trip_estimate(lsr, dlsr, arrival).unwrap();
        assert!((rtt.as_secs_f64() - 1.0).abs() < 0.001);
    }

    #[test]
    fn cumulative_lost_round_trips_negative() {
        let packed = pack_cumulative_lost(-5);
        assert_eq!(unpack_cumulative_lost(packed), -5);
    }

    #[test]
    fn cumulative_lost_round_trips_positive() {
        let packed = pack_cumulative_lost(12345);
        assert_eq!(unpack_cumulative_lost(packed), 12345);
    }

    #[test]
    fn cumulative_lost_clamps() {
        let packed = pack_cumulative_lost(1 << 30);
        assert_eq!(unpack_cumulative_lost(packed), (1i64 << 23) - 1);
    }
}
