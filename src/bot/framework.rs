use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use tokio::time::interval;
use tracing::info;

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::commands::{self, ModCommand};
use crate::config::Settings;
use crate::constants::limits::WINDOW_PRUNE_INTERVAL;
use crate::handlers::message;
use crate::services::moderation::sweep::Sweeper;
use crate::storage::snapshot::JsonSnapshotFile;
use crate::storage::store::PunishmentStore;
use crate::transport::telegram::TelegramTransport;
use crate::transport::ChatTransport;
use crate::utils::clock;

pub async fn run(settings: Settings) -> Result<(), Error> {
    let bot = Bot::new(settings.bot_token.clone());
    let me = bot.get_me().await?;
    info!("Bot connected as {}", me.username());

    let backend = Arc::new(JsonSnapshotFile::new(&settings.data_file));
    let store = Arc::new(PunishmentStore::open(backend).await?);
    let transport: Arc<dyn ChatTransport> = Arc::new(TelegramTransport::new(bot.clone()));

    let data = Arc::new(Data::new(
        settings.clone(),
        store.clone(),
        transport.clone(),
        me.user.id.0,
    ));

    // Reconciliation sweep: one pass immediately, then on a fixed timer.
    let sweeper = Arc::new(Sweeper::new(store, transport, settings.chat_id));
    sweeper.spawn();
    info!("Started punishment sweep");

    // Keep the per-user window maps bounded over long uptimes.
    let maintenance = data.clone();
    tokio::spawn(async move {
        let mut ticker = interval(WINDOW_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            let now = clock::now();
            maintenance.flood_gate.prune_idle(now);
            maintenance.spam_tracker.prune_idle(now);
        }
    });

    info!("Serving updates...");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![data])
        .default_handler(|update| async move {
            tracing::debug!("Unhandled update: {:?}", update);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Update handler failed",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn schema() -> UpdateHandler<Error> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<ModCommand>()
                .endpoint(commands::handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some())
                .endpoint(message::handle_chat_message),
        )
}
