use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use chrono::{NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tokio::{sync::Mutex, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::reminder::{Reminder, ReminderId};
use crate::schedule::TriggerInstant;
use crate::storage::ReminderStorage;

use super::ReminderDeliveryChannel;

pub const DELIVERY_ATTEMPTS: u8 = 5;

#[derive(Debug, Clone)]
pub struct NotifierOptions {
    pub poll_interval: Duration,
    /// How far back the first poll looks for triggers that were missed.
    pub catch_up: TimeDelta,
    /// Zone the reminder dates and times are written in.
    pub timezone: Tz,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            catch_up: TimeDelta::zero(),
            timezone: Tz::UTC,
        }
    }
}

/// Identifies one delivered trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationTag {
    pub reminder_id: ReminderId,
    pub at: NaiveDateTime,
}

#[derive(Default)]
struct NotifierState {
    last_checked: Option<NaiveDateTime>,
    delivered: HashSet<NotificationTag>,
    /// Failed deliveries and how many attempts each has left.
    retries: HashMap<NotificationTag, u8>,
}

pub struct DueReminderNotifier {
    storage: Arc<dyn ReminderStorage>,
    delivery_channel: Arc<dyn ReminderDeliveryChannel>,
    options: NotifierOptions,
    state: Mutex<NotifierState>,
}

impl DueReminderNotifier {
    pub fn new(
        storage: Arc<dyn ReminderStorage>,
        delivery_channel: Arc<dyn ReminderDeliveryChannel>,
        options: NotifierOptions,
    ) -> Self {
        Self {
            storage,
            delivery_channel,
            options,
            state: Mutex::new(NotifierState::default()),
        }
    }

    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.options.timezone).naive_local()
    }

    /// Delivers every trigger in `[last checked, now)` that has not been delivered yet.
    ///
    /// The window always advances to `now`. Failed deliveries are retried on the
    /// following polls, up to `DELIVERY_ATTEMPTS` attempts in total. Returns the
    /// number delivered.
    pub async fn check_due(&self, now: NaiveDateTime) -> anyhow::Result<usize> {
        let mut state = self.state.lock().await;
        let from = state
            .last_checked
            .unwrap_or_else(|| now - self.options.catch_up);
        if from >= now {
            state.last_checked.get_or_insert(now);
            return Ok(0);
        }

        state.delivered.retain(|tag| tag.at >= from);

        let reminders = self.storage.get_all().await?;
        let by_id: HashMap<ReminderId, &Reminder> = reminders
            .iter()
            .map(|reminder| (reminder.id, reminder))
            .collect();
        let mut delivered = 0;

        let mut pending: Vec<_> = state.retries.drain().collect();
        pending.sort();
        for (tag, attempts_left) in pending {
            let Some(reminder) = by_id.get(&tag.reminder_id) else {
                log::info!(
                    "Dropping retry for removed reminder. [reminder_id = {}]",
                    tag.reminder_id
                );
                continue;
            };
            let trigger = TriggerInstant {
                date: tag.at.date(),
                time: tag.at.time(),
            };

            if self.deliver(reminder, &trigger).await {
                state.delivered.insert(tag);
                delivered += 1;
            } else if attempts_left > 1 {
                state.retries.insert(tag, attempts_left - 1);
            } else {
                log::warn!(
                    "Giving up on reminder after {} attempts. [reminder_id = {}, at = {}]",
                    DELIVERY_ATTEMPTS,
                    tag.reminder_id,
                    trigger
                );
            }
        }

        for reminder in &reminders {
            for trigger in reminder.schedule.triggers(from, now) {
                let tag = NotificationTag {
                    reminder_id: reminder.id,
                    at: trigger.at(),
                };
                if state.delivered.contains(&tag) || state.retries.contains_key(&tag) {
                    continue;
                }

                if self.deliver(reminder, &trigger).await {
                    state.delivered.insert(tag);
                    delivered += 1;
                } else {
                    state.retries.insert(tag, DELIVERY_ATTEMPTS - 1);
                }
            }
        }

        state.last_checked = Some(now);

        if delivered > 0 {
            log::info!("Delivered {delivered} reminder notifications up to {now}");
        }

        Ok(delivered)
    }

    async fn deliver(&self, reminder: &Reminder, trigger: &TriggerInstant) -> bool {
        match self
            .delivery_channel
            .send_reminder_notification(reminder, trigger)
            .await
        {
            Ok(()) => true,
            Err(error) => {
                log::error!(
                    "Could not deliver reminder. [reminder_id = {}, at = {}, error = {:#}]",
                    reminder.id,
                    trigger,
                    error
                );
                false
            }
        }
    }

    /// Deliveries remembered for deduplication.
    pub async fn remembered_deliveries(&self) -> usize {
        self.state.lock().await.delivered.len()
    }

    /// Failed deliveries waiting for another attempt.
    pub async fn pending_retries(&self) -> usize {
        self.state.lock().await.retries.len()
    }

    /// Polls for due reminders until `cancellation_token` is cancelled.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        let mut interval = tokio::time::interval(self.options.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "Polling for due reminders every {:?} in {}",
            self.options.poll_interval,
            self.options.timezone
        );

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    log::info!("Due reminder notifier shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(error) = self.check_due(self.local_now()).await {
                        log::error!("Could not check due reminders. [error = {:#}]", error);
                    }
                }
            }
        }
    }
}
