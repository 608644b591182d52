//! The process-wide table of live sessions, keyed by session id.

use std::sync::Arc;

use service::registry::{Registry, RegistryConfig as ServiceRegistryConfig};

use crate::{config, session::AnySession};

pub type SessionRegistry = Registry<String, AnySession>;

impl From<&config::RegistryConfig> for ServiceRegistryConfig {
    fn from(config: &config::RegistryConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
            active_timeout: std::time::Duration::from_secs(config.active_timeout_secs),
            ..Default::default()
        }
    }
}

pub fn new_registry(config: &config::RegistryConfig) -> Arc<SessionRegistry> {
    Registry::new(config.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{session::Session, transport::udp::UdpTransport};

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let registry = new_registry(&config::RegistryConfig::default());
        let transport = Arc::new(
            UdpTransport::connect("127.0.0.1:0".parse().unwrap(), "127.0.0.1:1".parse().unwrap(), 1500)
                .await
                .unwrap(),
        );
        let session = Session::new(
            "a".to_string(),
            transport,
            crate::session::SessionConfig {
                payload_type: codec::rtp::AudioPayloadType::Pcmu,
                cname: "x@y".to_string(),
                rtcp_bandwidth_fraction: 0.05,
            },
            service::source::SourceTrackerConfig::default(),
            &crate::util::SystemRandom,
        );

        registry
            .create("a".to_string(), Arc::new(AnySession::Udp(session)))
            .unwrap();
        assert!(registry.get(&"a".to_string()).is_some());
        registry.stop_all();
    }
}
