use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wfb_core::{
    config::Config,
    connectivity,
    dispatch::Dispatcher,
    ports::DestinationClient,
    relay::Relay,
    status::StatusSource,
    supervisor::{Supervisor, SupervisorConfig},
    thumbnail::ThumbnailExtractor,
};
use wfb_whatsapp::GatewayClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wfb_core::logging::init("wfb")?;

    let cfg = Config::load()?;
    let shutdown = CancellationToken::new();

    let client: Arc<dyn DestinationClient> = Arc::new(GatewayClient::from_config(&cfg)?);
    let (writer, reader) = connectivity::channel();
    let supervisor = Supervisor::new(client.clone(), writer, SupervisorConfig::from(&cfg));
    let supervisor = tokio::spawn(supervisor.run(shutdown.clone()));

    let targets = Arc::new(cfg.targets.clone());
    let status = StatusSource::new(reader.clone(), cfg.targets.clone(), cfg.telegram_enabled());

    let bind = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let web_status = status.clone();
    tokio::spawn(async move {
        if let Err(e) = wfb_web::start(web_status, bind).await {
            error!("status page stopped: {e:#}");
        }
    });

    let forwarder = Arc::new(Dispatcher::new(
        Relay::new(client, reader.clone()),
        targets,
        reader,
        Arc::new(ThumbnailExtractor::from_config(&cfg)),
    ));

    match cfg.telegram_token.clone() {
        Some(token) => {
            wfb_telegram::router::run_polling(token, forwarder, status)
                .await
                .context("telegram bot failed")?;
        }
        None => {
            warn!("TELEGRAM_TOKEN not set; telegram listener disabled");
            tokio::signal::ctrl_c()
                .await
                .context("failed to wait for ctrl-c")?;
        }
    }

    info!("shutting down");
    shutdown.cancel();
    wait_for_supervisor(supervisor).await;
    Ok(())
}

/// Returns `false` when the supervisor task panicked or was aborted.
async fn wait_for_supervisor(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!("whatsapp supervisor failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_a_panicked_supervisor() {
        let task = tokio::spawn(async { panic!("supervisor blew up") });
        assert!(!wait_for_supervisor(task).await);

        assert!(wait_for_supervisor(tokio::spawn(async {})).await);
    }
}
