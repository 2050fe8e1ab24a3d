use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tokio_util::sync::CancellationToken;

use crate::reminder::{Reminder, ReminderId, Visibility};
use crate::schedule::{Recurrence, Schedule, TriggerInstant};
use crate::storage::{InMemoryReminderStorage, NewReminder, ReminderStorage};

use super::*;

type ReceivedMessages = Arc<Mutex<Vec<(ReminderId, NaiveDateTime)>>>;

#[derive(Clone, Default)]
struct TestDeliveryChannel {
    received_messages: ReceivedMessages,
    failing: Arc<Mutex<HashSet<ReminderId>>>,
    attempts: Arc<Mutex<usize>>,
}

#[async_trait]
impl ReminderDeliveryChannel for TestDeliveryChannel {
    async fn send_reminder_notification(
        &self,
        reminder: &Reminder,
        trigger: &TriggerInstant,
    ) -> anyhow::Result<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.failing.lock().unwrap().contains(&reminder.id) {
            anyhow::bail!("channel unavailable");
        }
        self.received_messages
            .lock()
            .unwrap()
            .push((reminder.id, trigger.at()));
        Ok(())
    }
}

struct TestContext {
    pub channel: TestDeliveryChannel,
    pub storage: Arc<InMemoryReminderStorage>,
    pub notifier: Arc<DueReminderNotifier>,
}

impl TestContext {
    fn new(catch_up: TimeDelta) -> Self {
        let channel = TestDeliveryChannel::default();
        let storage = Arc::new(InMemoryReminderStorage::new());
        let options = NotifierOptions {
            catch_up,
            ..Default::default()
        };
        let notifier = Arc::new(DueReminderNotifier::new(
            storage.clone(),
            Arc::new(channel.clone()),
            options,
        ));

        Self {
            channel,
            storage,
            notifier,
        }
    }

    async fn add(&self, schedule: Schedule) -> ReminderId {
        let reminder = NewReminder {
            owner: 1,
            title: "Check in".to_string(),
            visibility: Visibility::Private,
            schedule,
        };
        self.storage.insert(reminder).await.unwrap().id
    }

    fn received(&self) -> Vec<(ReminderId, NaiveDateTime)> {
        self.channel.received_messages.lock().unwrap().clone()
    }

    fn take_attempts(&self) -> usize {
        std::mem::take(&mut *self.channel.attempts.lock().unwrap())
    }
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, d)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn daily_at(h: u32, m: u32) -> Schedule {
    Schedule::advanced(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        None,
        NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        Vec::new(),
        Recurrence::Daily,
    )
    .unwrap()
}

#[tokio::test]
async fn delivers_triggers_that_elapsed_since_last_poll() {
    let ctx = TestContext::new(TimeDelta::hours(1));
    let id = ctx.add(daily_at(9, 0)).await;

    assert_eq!(ctx.notifier.check_due(at(2, 8, 30)).await.unwrap(), 0);
    assert_eq!(ctx.notifier.check_due(at(2, 9, 0)).await.unwrap(), 0);
    assert_eq!(ctx.notifier.check_due(at(2, 9, 1)).await.unwrap(), 1);
    assert_eq!(ctx.notifier.check_due(at(3, 9, 1)).await.unwrap(), 1);

    assert_eq!(ctx.received(), vec![(id, at(2, 9, 0)), (id, at(3, 9, 0))]);
}

#[tokio::test]
async fn first_poll_catches_up_on_missed_triggers() {
    let ctx = TestContext::new(TimeDelta::hours(2));
    let id = ctx.add(daily_at(9, 0)).await;
    ctx.add(daily_at(6, 0)).await;

    ctx.notifier.check_due(at(2, 10, 0)).await.unwrap();

    assert_eq!(ctx.received(), vec![(id, at(2, 9, 0))]);
}

#[tokio::test]
async fn repeated_poll_is_idempotent() {
    let ctx = TestContext::new(TimeDelta::hours(1));
    ctx.add(daily_at(9, 0)).await;

    ctx.notifier.check_due(at(2, 9, 30)).await.unwrap();
    ctx.notifier.check_due(at(2, 9, 30)).await.unwrap();
    ctx.notifier.check_due(at(2, 9, 10)).await.unwrap();

    assert_eq!(ctx.received().len(), 1);
}

#[tokio::test]
async fn failed_delivery_is_retried_without_repeating_others() {
    let ctx = TestContext::new(TimeDelta::hours(1));
    let flaky = ctx.add(daily_at(9, 0)).await;
    let steady = ctx.add(daily_at(9, 15)).await;
    ctx.channel.failing.lock().unwrap().insert(flaky);

    assert_eq!(ctx.notifier.check_due(at(2, 9, 30)).await.unwrap(), 1);

    ctx.channel.failing.lock().unwrap().clear();
    assert_eq!(ctx.notifier.check_due(at(2, 9, 31)).await.unwrap(), 1);

    assert_eq!(
        ctx.received(),
        vec![(steady, at(2, 9, 15)), (flaky, at(2, 9, 0))]
    );
}

#[tokio::test]
async fn failing_channel_gives_up_after_bounded_attempts() {
    let ctx = TestContext::new(TimeDelta::hours(1));
    let id = ctx.add(daily_at(9, 0)).await;
    ctx.channel.failing.lock().unwrap().insert(id);

    let mut attempts_per_poll = Vec::new();
    for day in 2..=21 {
        assert_eq!(ctx.notifier.check_due(at(day, 9, 30)).await.unwrap(), 0);
        attempts_per_poll.push(ctx.take_attempts());
        assert!(ctx.notifier.pending_retries().await < DELIVERY_ATTEMPTS as usize);
    }

    let expected: Vec<usize> = (1..=20)
        .map(|poll| poll.min(DELIVERY_ATTEMPTS as usize))
        .collect();
    assert_eq!(attempts_per_poll, expected);
    assert!(ctx.received().is_empty());
}

#[tokio::test]
async fn window_advances_past_failed_delivery() {
    let ctx = TestContext::new(TimeDelta::hours(1));
    let flaky = ctx.add(daily_at(9, 0)).await;
    ctx.channel.failing.lock().unwrap().insert(flaky);

    ctx.notifier.check_due(at(2, 9, 30)).await.unwrap();
    ctx.channel.failing.lock().unwrap().clear();
    let steady = ctx.add(daily_at(9, 40)).await;

    assert_eq!(ctx.notifier.check_due(at(2, 10, 0)).await.unwrap(), 2);
    assert_eq!(ctx.notifier.pending_retries().await, 0);
    assert_eq!(
        ctx.received(),
        vec![(flaky, at(2, 9, 0)), (steady, at(2, 9, 40))]
    );
}

#[tokio::test]
async fn remembered_deliveries_are_pruned_across_days() {
    let ctx = TestContext::new(TimeDelta::days(1));
    let schedule = Schedule::advanced(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        None,
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        [NaiveTime::from_hms_opt(9, 0, 0).unwrap()],
        Recurrence::Daily,
    )
    .unwrap();
    ctx.add(schedule).await;

    for day in 2..=30 {
        assert_eq!(ctx.notifier.check_due(at(day, 20, 0)).await.unwrap(), 2);
        assert_eq!(ctx.notifier.remembered_deliveries().await, 2);
    }

    assert_eq!(ctx.received().len(), 58);
}

#[tokio::test]
async fn alert_times_are_delivered_separately() {
    let ctx = TestContext::new(TimeDelta::zero());
    let schedule = Schedule::simple(
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        [NaiveTime::from_hms_opt(8, 45, 0).unwrap()],
    );
    let id = ctx.add(schedule).await;

    ctx.notifier.check_due(at(2, 8, 0)).await.unwrap();
    ctx.notifier.check_due(at(2, 12, 0)).await.unwrap();
    ctx.notifier.check_due(at(3, 12, 0)).await.unwrap();

    assert_eq!(ctx.received(), vec![(id, at(2, 8, 45)), (id, at(2, 9, 0))]);
}

#[tokio::test(start_paused = true)]
async fn run_stops_when_cancelled() {
    let ctx = TestContext::new(TimeDelta::zero());
    let token = CancellationToken::new();
    let notifier = Arc::clone(&ctx.notifier);
    let task_token = token.clone();

    let task = tokio::spawn(async move { notifier.run(task_token).await });
    tokio::time::sleep(Duration::from_secs(180)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), task).await;
    assert!(result.is_ok(), "Notifier should stop after cancellation");
}
