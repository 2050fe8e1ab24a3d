mod model;
mod reminder_storage;
mod seed;

pub use model::{NewReminder, SeedReminder};
pub use reminder_storage::{InMemoryReminderStorage, ReminderStorage};
pub use seed::seed_from_file;
