pub mod config;
pub mod error;
pub mod observer;
pub mod registry;
pub mod rtcp_session;
pub mod rtp_session;
pub mod session;
pub mod statistics;
pub mod transport;
pub mod util;

use std::sync::Arc;

use self::{
    config::Config,
    session::{AnySession, Session, SessionConfig},
    statistics::Statistics,
    transport::{muxed::MuxedTransport, udp::UdpTransport, udp_rtcp::UdpRtcpTransport},
    util::SystemRandom,
};

/// Builds one session per configured transport, registers it, and starts it.
/// Used by both the binary entry point and integration tests that want a
/// running engine without going through `main`.
pub async fn startup(config: Arc<Config>) -> anyhow::Result<()> {
    let registry = registry::new_registry(&config.registry);
    let statistics = Statistics::<String>::default();

    for (index, transport) in config.transports.iter().enumerate() {
        let id = format!("session-{index}");
        let any = build_session(&config, id.clone(), transport).await?;

        statistics.register(id.clone(), any.stats_handle());
        registry.create(id, any.clone())?;
        any.start()?;
    }

    std::future::pending::<()>().await;

    #[allow(unreachable_code)]
    Ok(())
}

async fn build_session(
    config: &Config,
    id: String,
    transport: &config::Transport,
) -> anyhow::Result<Arc<AnySession>> {
    let session_config = SessionConfig {
        payload_type: config.session.payload_type.into(),
        cname: format!("{}-{}", config.session.cname_prefix, id),
        rtcp_bandwidth_fraction: config.session.rtcp_bandwidth_fraction,
    };
    let source_config = (&config.session).into();
    let mtu = config.session.mtu;

    let any = match transport {
        config::Transport::PlainUdp {
            rtp_listen,
            rtcp_listen,
            peer_rtp,
            peer_rtcp,
        } => {
            let transport = Arc::new(
                UdpRtcpTransport::connect(*rtp_listen, *rtcp_listen, *peer_rtp, *peer_rtcp, mtu).await?,
            );
            AnySession::UdpRtcp(Session::new(id, transport, session_config, source_config, &SystemRandom))
        }
        config::Transport::UdpOnly { listen, peer } => {
            let transport = Arc::new(UdpTransport::connect(*listen, *peer, mtu).await?);
            AnySession::Udp(Session::new(id, transport, session_config, source_config, &SystemRandom))
        }
        config::Transport::Multiplexed { listen, peer } => {
            let transport = Arc::new(MuxedTransport::connect(*listen, *peer, mtu).await?);
            AnySession::Muxed(Session::new(id, transport, session_config, source_config, &SystemRandom))
        }
    };

    Ok(Arc::new(any))
}
