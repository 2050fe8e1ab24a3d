use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{Schedule, TriggerInstant};

/// Lazy sequence of occurrence dates. Unbounded unless the schedule has an end date.
pub struct Occurrences<'a> {
    schedule: &'a Schedule,
    cursor: Option<NaiveDate>,
}

impl<'a> Occurrences<'a> {
    pub(super) fn new(schedule: &'a Schedule, from: NaiveDate) -> Self {
        Self {
            schedule,
            cursor: Some(from),
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let found = self.schedule.next_occurrence_on_or_after(self.cursor?);
        self.cursor = found.and_then(|date| date.succ_opt());
        found
    }
}

pub struct Triggers<'a> {
    occurrences: Occurrences<'a>,
    times: Vec<NaiveTime>,
    from: NaiveDateTime,
    to: NaiveDateTime,
    current: Option<(NaiveDate, usize)>,
    exhausted: bool,
}

impl<'a> Triggers<'a> {
    pub(super) fn new(schedule: &'a Schedule, from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self {
            occurrences: schedule.occurrences_from(from.date()),
            times: schedule.trigger_times(),
            from,
            to,
            current: None,
            exhausted: from >= to,
        }
    }
}

impl Iterator for Triggers<'_> {
    type Item = TriggerInstant;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            if let Some((date, index)) = self.current {
                if let Some(time) = self.times.get(index).copied() {
                    self.current = Some((date, index + 1));
                    let trigger = TriggerInstant { date, time };
                    if trigger.at() < self.from {
                        continue;
                    }
                    if trigger.at() >= self.to {
                        break;
                    }
                    return Some(trigger);
                }
            }

            match self.occurrences.next() {
                Some(date) if date <= self.to.date() => self.current = Some((date, 0)),
                _ => break,
            }
        }

        self.exhausted = true;
        None
    }
}
