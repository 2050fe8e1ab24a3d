use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::reminder::{Reminder, ReminderId, UserId};

use super::NewReminder;

#[async_trait]
pub trait ReminderStorage: Send + Sync {
    async fn insert(&self, reminder: NewReminder) -> anyhow::Result<Reminder>;
    async fn update(&self, reminder: Reminder) -> anyhow::Result<Reminder>;
    async fn delete(&self, id: ReminderId) -> anyhow::Result<()>;
    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>>;
    async fn get_all(&self) -> anyhow::Result<Vec<Reminder>>;
    /// The user's own reminders plus every public one.
    async fn get_visible_to(&self, user: UserId) -> anyhow::Result<Vec<Reminder>>;
}

struct InMemoryReminderStore {
    next_id: ReminderId,
    reminders: HashMap<ReminderId, Reminder>,
}

pub struct InMemoryReminderStorage {
    store: RwLock<InMemoryReminderStore>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        InMemoryReminderStorage {
            store: RwLock::new(InMemoryReminderStore {
                next_id: 1,
                reminders: HashMap::new(),
            }),
        }
    }
}

impl Default for InMemoryReminderStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_by_id(mut reminders: Vec<Reminder>) -> Vec<Reminder> {
    reminders.sort_by_key(|reminder| reminder.id);
    reminders
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    async fn insert(&self, reminder: NewReminder) -> anyhow::Result<Reminder> {
        let mut store = self.store.write().await;
        let id = store.next_id;
        let inserted = Reminder {
            id,
            owner: reminder.owner,
            title: reminder.title,
            visibility: reminder.visibility,
            schedule: reminder.schedule,
        };

        store.reminders.insert(id, inserted.clone());
        store.next_id += 1;

        log::info!("Inserted reminder {id}");
        Ok(inserted)
    }

    async fn update(&self, reminder: Reminder) -> anyhow::Result<Reminder> {
        let mut store = self.store.write().await;
        match store.reminders.get_mut(&reminder.id) {
            Some(existing) => {
                *existing = reminder.clone();
                Ok(reminder)
            }
            None => anyhow::bail!("Reminder {} does not exist", reminder.id),
        }
    }

    async fn delete(&self, id: ReminderId) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        if store.reminders.remove(&id).is_none() {
            anyhow::bail!("Reminder {id} does not exist");
        }

        log::info!("Deleted reminder {id}");
        Ok(())
    }

    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>> {
        let store = self.store.read().await;
        Ok(store.reminders.get(&id).cloned())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Reminder>> {
        let store = self.store.read().await;
        Ok(sorted_by_id(store.reminders.values().cloned().collect()))
    }

    async fn get_visible_to(&self, user: UserId) -> anyhow::Result<Vec<Reminder>> {
        let store = self.store.read().await;
        let visible = store
            .reminders
            .values()
            .filter(|reminder| reminder.is_visible_to(user))
            .cloned()
            .collect();

        Ok(sorted_by_id(visible))
    }
}
