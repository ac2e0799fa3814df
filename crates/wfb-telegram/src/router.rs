use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use wfb_core::{dispatch::Dispatcher as ForwardDispatcher, status::StatusSource};

use crate::handlers;
use crate::TelegramOrigin;

#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<ForwardDispatcher>,
    pub status: StatusSource,
    pub origin: Arc<TelegramOrigin>,
}

/// Run the Telegram long-polling loop until Ctrl-C.
pub async fn run_polling(
    token: String,
    forwarder: Arc<ForwardDispatcher>,
    status: StatusSource,
) -> anyhow::Result<()> {
    let bot = Bot::new(token);

    match bot.get_me().await {
        Ok(me) => info!("telegram bot started: @{}", me.username()),
        Err(e) => warn!("telegram get_me failed: {e}"),
    }
    let targets = forwarder
        .targets()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>();
    if targets.is_empty() {
        warn!("no whatsapp targets configured; messages will be rejected");
    } else {
        info!("whatsapp targets: {}", targets.join(", "));
    }

    let state = Arc::new(AppState {
        forwarder,
        status,
        origin: Arc::new(TelegramOrigin::new(bot.clone())),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
