//! NTP 64-bit fixed-point timestamp conversion.
//!
//! [rfc3550 §4](https://datatracker.ietf.org/doc/html/rfc3550#section-4): the
//! timestamp is a 64 bit unsigned fixed-point number with the integer part
//! in the first 32 bits and the fractional part in the last 32 bits, epoch
//! 1900-01-01 00:00 UTC. One fractional unit is `2^-32` seconds.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
const NTP_TO_UNIX_EPOCH_OFFSET: u64 = 2_208_988_800;

/// A 64 bit fixed-point NTP timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtpTimestamp(pub u64);

impl NtpTimestamp {
    /// Converts a `SystemTime` into its NTP representation. Bit-exact for
    /// any duration representable as whole nanoseconds since the Unix epoch.
    ///
    /// ```
    /// use std::time::{SystemTime, Duration};
    /// use rtp_session_codec::ntp::NtpTimestamp;
    ///
    /// let now = SystemTime::now();
    /// let ntp = NtpTimestamp::from_system_time(now);
    /// let back = ntp.to_system_time();
    /// let delta = back.duration_since(now).unwrap_or_else(|e| e.duration());
    /// assert!(delta < Duration::from_micros(1));
    /// ```
    pub fn from_system_time(time: SystemTime) -> Self {
        let since_unix = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        let seconds = since_unix.as_secs() + NTP_TO_UNIX_EPOCH_OFFSET;
        let frac = ((since_unix.subsec_nanos() as u64) << 32) / 1_000_000_000;
        Self((seconds << 32) | (frac & 0xffff_ffff))
    }

    pub fn to_system_time(self) -> SystemTime {
        let seconds = (self.0 >> 32).saturating_sub(NTP_TO_UNIX_EPOCH_OFFSET);
        let frac = self.0 & 0xffff_ffff;
        let nanos = (frac * 1_000_000_000) >> 32;
        UNIX_EPOCH + Duration::new(seconds, nanos as u32)
    }

    /// The middle 32 bits, as embedded in an SR's LSR and echoed back in a
    /// peer's RR via DLSR (rfc3550 §6.4.1).
    pub fn middle_32(self) -> u32 {
        ((self.0 >> 16) & 0xffff_ffff) as u32
    }

    pub fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn fraction(self) -> u32 {
        (self.0 & 0xffff_ffff) as u32
    }

    pub fn from_parts(seconds: u32, fraction: u32) -> Self {
        Self(((seconds as u64) << 32) | fraction as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_exactly() {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_000);
        let ntp = NtpTimestamp::from_system_time(t);
        let back = ntp.to_system_time();
        let delta = if back > t {
            back.duration_since(t).unwrap()
        } else {
            t.duration_since(back).unwrap()
        };
        assert!(delta < Duration::from_nanos(20));
    }

    #[test]
    fn parts_round_trip() {
        let ntp = NtpTimestamp::from_parts(0xdead_beef, 0x1234_5678);
        assert_eq!(ntp.seconds(), 0xdead_beef);
        assert_eq!(ntp.fraction(), 0x1234_5678);
    }

    #[test]
    fn middle_32_matches_manual_shift() {
        let ntp = NtpTimestamp(0x1122_3344_5566_7788);
        assert_eq!(ntp.middle_32(), 0x3344_5566);
    }
}
