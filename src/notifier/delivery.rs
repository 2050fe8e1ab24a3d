use async_trait::async_trait;

use crate::reminder::Reminder;
use crate::schedule::TriggerInstant;

#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn send_reminder_notification(
        &self,
        reminder: &Reminder,
        trigger: &TriggerInstant,
    ) -> anyhow::Result<()>;
}

pub struct LogDeliveryChannel;

#[async_trait]
impl ReminderDeliveryChannel for LogDeliveryChannel {
    async fn send_reminder_notification(
        &self,
        reminder: &Reminder,
        trigger: &TriggerInstant,
    ) -> anyhow::Result<()> {
        log::info!(
            "[REMINDER] {} at {} ({}). [reminder_id = {}, owner = {}]",
            reminder.title,
            trigger,
            reminder.schedule.recurrence().frequency_name(),
            reminder.id,
            reminder.owner
        );
        Ok(())
    }
}
