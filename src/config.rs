use std::{fs::read_to_string, net::SocketAddr, time::Duration};

use anyhow::Result;
use clap::Parser;
use codec::rtp::AudioPayloadType;
use serde::{Deserialize, Serialize};

/// The RFC 3551 static payload types this engine ships decode/encode support
/// for, named so they can be written directly into a config file.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadTypeName {
    Pcmu,
    Gsm,
    Pcma,
    G722,
    G728,
    G729,
    /// A dynamically negotiated payload type number, 96..=127.
    Dynamic(u8),
}

impl From<PayloadTypeName> for AudioPayloadType {
    fn from(name: PayloadTypeName) -> Self {
        match name {
            PayloadTypeName::Pcmu => Self::Pcmu,
            PayloadTypeName::Gsm => Self::Gsm,
            PayloadTypeName::Pcma => Self::Pcma,
            PayloadTypeName::G722 => Self::G722,
            PayloadTypeName::G728 => Self::G728,
            PayloadTypeName::G729 => Self::G729,
            PayloadTypeName::Dynamic(n) => Self::Dynamic(n),
        }
    }
}

/// Which socket layout a session's transport uses. Every variant names both
/// the local listening address(es) and the remote peer address(es); this
/// engine has no signaling layer of its own, so the peer must already be
/// known (e.g. negotiated out of band via SDP) before the process starts.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(tag = "transport", rename_all = "kebab-case")]
pub enum Transport {
    /// A single RTP socket, paired with a separate RTCP socket.
    PlainUdp {
        rtp_listen: SocketAddr,
        rtcp_listen: SocketAddr,
        peer_rtp: SocketAddr,
        peer_rtcp: SocketAddr,
    },
    /// A single RTP socket with no RTCP path at all (rare, but some legacy
    /// peers only ever send media).
    UdpOnly { listen: SocketAddr, peer: SocketAddr },
    /// RTP and RTCP share one socket, demultiplexed per rfc5761.
    Multiplexed { listen: SocketAddr, peer: SocketAddr },
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimit {
    #[serde(default = "RateLimit::max_packets_per_second")]
    pub max_packets_per_second: u32,
}

impl RateLimit {
    fn max_packets_per_second() -> u32 {
        2000
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_packets_per_second: Self::max_packets_per_second(),
        }
    }
}

/// Tunables for the source tracker and RTCP scheduler, shared by every
/// session the process runs.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SessionDefaults {
    ///
    /// RTP clock rate in Hz, used both to generate outgoing timestamps and
    /// to convert jitter into RTP clock units.
    ///
    #[serde(default = "SessionDefaults::clock_rate")]
    pub clock_rate: u32,
    ///
    /// Consecutive in-order packets required before a new SSRC is trusted.
    ///
    #[serde(default = "SessionDefaults::probation_packets")]
    pub probation_packets: u32,
    ///
    /// Out-of-sequence packets tolerated before a still-unvalidated source
    /// is dropped.
    ///
    #[serde(default = "SessionDefaults::max_probation_failures")]
    pub max_probation_failures: u32,
    ///
    /// Seconds of silence after which a remote source is forgotten.
    ///
    #[serde(default = "SessionDefaults::source_timeout_secs")]
    pub source_timeout_secs: u64,
    ///
    /// Per-source inbound packet budget; `None` disables rate limiting.
    ///
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
    ///
    /// Fraction of session bandwidth the RTCP scheduler may spend.
    ///
    #[serde(default = "SessionDefaults::rtcp_bandwidth_fraction")]
    pub rtcp_bandwidth_fraction: f64,
    ///
    /// Static audio payload type every session is created with.
    ///
    #[serde(default = "SessionDefaults::payload_type")]
    pub payload_type: PayloadTypeName,
    ///
    /// The user part of the RTCP SDES CNAME item; each session's id is
    /// appended to keep CNAMEs distinct across a multi-session process.
    ///
    #[serde(default = "SessionDefaults::cname_prefix")]
    pub cname_prefix: String,
    ///
    /// Maximum datagram size a transport will send or accept.
    ///
    #[serde(default = "SessionDefaults::mtu")]
    pub mtu: usize,
}

impl SessionDefaults {
    fn clock_rate() -> u32 {
        8000
    }

    fn payload_type() -> PayloadTypeName {
        PayloadTypeName::Pcmu
    }

    fn cname_prefix() -> String {
        "rtp-session".to_string()
    }

    fn mtu() -> usize {
        1500
    }

    fn probation_packets() -> u32 {
        2
    }

    fn max_probation_failures() -> u32 {
        5
    }

    fn source_timeout_secs() -> u64 {
        30
    }

    fn rtcp_bandwidth_fraction() -> f64 {
        0.05
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            clock_rate: Self::clock_rate(),
            probation_packets: Self::probation_packets(),
            max_probation_failures: Self::max_probation_failures(),
            source_timeout_secs: Self::source_timeout_secs(),
            rate_limit: Some(RateLimit::default()),
            rtcp_bandwidth_fraction: Self::rtcp_bandwidth_fraction(),
            payload_type: Self::payload_type(),
            cname_prefix: Self::cname_prefix(),
            mtu: Self::mtu(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryConfig {
    ///
    /// Maximum number of concurrently open sessions.
    ///
    #[serde(default = "RegistryConfig::max_sessions")]
    pub max_sessions: usize,
    ///
    /// Seconds an `Active` session may sit idle before the registry stops
    /// and removes it.
    ///
    #[serde(default = "RegistryConfig::active_timeout_secs")]
    pub active_timeout_secs: u64,
}

impl RegistryConfig {
    fn max_sessions() -> usize {
        10_000
    }

    fn active_timeout_secs() -> u64 {
        60
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: Self::max_sessions(),
            active_timeout_secs: Self::active_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_level(&self) -> log::Level {
        match *self {
            Self::Error => log::Level::Error,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Log {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub transports: Vec<Transport>,
    #[serde(default)]
    pub session: SessionDefaults,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub log: Log,
}

impl From<&RateLimit> for service::source::RateLimit {
    fn from(limit: &RateLimit) -> Self {
        Self {
            max_packets_per_second: limit.max_packets_per_second,
            ..Default::default()
        }
    }
}

impl From<&SessionDefaults> for service::source::SourceTrackerConfig {
    fn from(defaults: &SessionDefaults) -> Self {
        Self {
            probation_packets: defaults.probation_packets,
            max_probation_failures: defaults.max_probation_failures,
            source_timeout: defaults.source_timeout(),
            rate_limit: defaults.rate_limit.as_ref().map(Into::into),
            clock_rate: defaults.clock_rate,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Cli {
    ///
    /// Specify the configuration file path
    ///
    /// Example: rtp-session --config /etc/rtp-session/config.json5
    ///
    #[arg(long, short)]
    config: String,
}

impl Config {
    ///
    /// Load configuration from the file named on the command line.
    ///
    pub fn load() -> Result<Self> {
        Ok(serde_json5::from_str::<Self>(&read_to_string(
            &Cli::parse().config,
        )?)?)
    }
}
