use std::sync::Arc;

use reminders::appsettings::AppSettings;
use reminders::notifier::{DueReminderNotifier, LogDeliveryChannel};
use reminders::storage::{self, InMemoryReminderStorage, ReminderStorage};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new()?;
    log::info!("Loaded settings {settings:?}");

    let reminder_storage: Arc<dyn ReminderStorage> = Arc::new(InMemoryReminderStorage::new());
    if let Some(seed_file) = &settings.storage.seed_file {
        let seeded = storage::seed_from_file(reminder_storage.as_ref(), seed_file).await?;
        log::info!("Seeded {seeded} reminders from {}", seed_file.display());
    }

    let notifier = Arc::new(DueReminderNotifier::new(
        reminder_storage,
        Arc::new(LogDeliveryChannel),
        settings.notifier.to_options()?,
    ));

    let cancellation_token = CancellationToken::new();
    let notifier_task = {
        let notifier = Arc::clone(&notifier);
        let token = cancellation_token.child_token();
        tokio::spawn(async move { notifier.run(token).await })
    };

    tokio::signal::ctrl_c().await?;
    log::info!("Received Ctrl-C, shutting down");
    cancellation_token.cancel();
    notifier_task.await?;

    Ok(())
}
