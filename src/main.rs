use std::sync::Arc;

use rtp_session::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(Config::load()?);
    simple_logger::init_with_level(config.log.level.as_level())?;

    if config.transports.is_empty() {
        log::warn!(
            "no transports are configured, no sessions will run, it's just a program without any functionality :-)"
        );

        return Ok(());
    }

    rtp_session::startup(config).await
}
