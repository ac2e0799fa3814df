use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    connectivity::ConnectivityWriter,
    ports::DestinationClient,
};

#[derive(Clone, Copy, Debug)]
pub struct SupervisorConfig {
    /// Delay between loop iterations.
    pub idle_delay: Duration,
    /// Extra delay after a failed connection attempt.
    pub retry_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_secs(1),
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for SupervisorConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            idle_delay: cfg.supervisor_idle,
            retry_delay: cfg.reconnect_delay,
        }
    }
}

/// Keeps the WhatsApp session up for the lifetime of the process.
///
/// The supervisor is the only writer of the connectivity cell; the pairing
/// callback it hands to the client writes through the same writer.
pub struct Supervisor {
    client: Arc<dyn DestinationClient>,
    state: ConnectivityWriter,
    cfg: SupervisorConfig,
}

impl Supervisor {
    pub fn new(
        client: Arc<dyn DestinationClient>,
        state: ConnectivityWriter,
        cfg: SupervisorConfig,
    ) -> Self {
        Self { client, state, cfg }
    }

    /// Run until `shutdown` is cancelled. There is no retry limit.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut connected = false;
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            if !connected {
                let attempt = self.state.begin_attempt();
                info!(attempt, "connecting to whatsapp...");
                let res = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    res = self.client.connect(self.state.pairing_sink()) => res,
                };
                match res {
                    Ok(()) => {
                        connected = true;
                        self.state.mark_connected();
                        info!(attempt, "whatsapp connected");
                    }
                    Err(e) => {
                        error!(attempt, "whatsapp connection error: {e}");
                        self.state.mark_disconnected(Some(e.to_string()));
                        if !sleep_or_cancel(self.cfg.retry_delay, &shutdown).await {
                            break;
                        }
                    }
                }
            } else {
                let alive = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    alive = self.client.is_alive() => alive,
                };
                if !alive {
                    warn!("whatsapp session dropped; reconnecting");
                    connected = false;
                    self.state.mark_disconnected(None);
                }
            }

            if !sleep_or_cancel(self.cfg.idle_delay, &shutdown).await {
                break;
            }
        }
        info!("whatsapp supervisor stopped");
    }
}

/// Returns `false` when cancelled before the delay elapsed.
async fn sleep_or_cancel(delay: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
