use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use tracing::info;

use crate::bot::error::Error;
use crate::community::data::HeraldData;
use crate::community::handlers::{self, HeraldCommand};
use crate::config::Settings;
use crate::services::stats::usage::UsageStats;

pub async fn run(settings: Settings) -> Result<(), Error> {
    let bot = Bot::new(settings.bot_token.clone());
    let me = bot.get_me().await?;
    info!("Bot connected as {}", me.username());

    let stats = UsageStats::open(&settings.stats_file).await;
    let data = Arc::new(HeraldData::new(settings, stats));

    // The daily activity counter resets at midnight.
    let reset = data.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(until_next_midnight()).await;
            reset.stats.reset_daily().await;
            info!("Daily activity counter reset");
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
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_timeframe))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<HeraldCommand>()
                        .endpoint(handlers::handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.new_chat_members().is_some())
                        .endpoint(handlers::handle_new_members),
                ),
        )
}

fn until_next_midnight() -> Duration {
    let now = Utc::now();
    let next = (now.date_naive() + chrono::Days::new(1))
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| now + chrono::Duration::hours(24));
    (next - now).to_std().unwrap_or(Duration::from_secs(3600))
}
