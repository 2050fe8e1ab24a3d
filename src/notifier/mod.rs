mod delivery;
mod due_notifier;

pub use delivery::{LogDeliveryChannel, ReminderDeliveryChannel};
pub use due_notifier::{DELIVERY_ATTEMPTS, DueReminderNotifier, NotificationTag, NotifierOptions};

#[cfg(test)]
mod tests;
