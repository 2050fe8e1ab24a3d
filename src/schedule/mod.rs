//! Reminder schedules and their expansion into occurrences and trigger instants.

mod error;
mod occurrences;
mod recurrence;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub use error::ScheduleError;
pub use occurrences::{Occurrences, Triggers};
pub use recurrence::{
    IntervalUnit, Recurrence, WeekOfMonth, WeekdaySet, days_in_month, weekday_from_index,
    weekday_index,
};

/// A reminder that fires once, on `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSchedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub alert_times: BTreeSet<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedSchedule {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: Option<NaiveDate>,
    pub time: NaiveTime,
    pub alert_times: BTreeSet<NaiveTime>,
    pub recurrence: Recurrence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Simple(SimpleSchedule),
    Advanced(AdvancedSchedule),
}

/// A concrete date and time at which a notification is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerInstant {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl TriggerInstant {
    pub fn at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

impl fmt::Display for TriggerInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time.format("%H:%M"))
    }
}

/// Trigger times have minute precision.
pub fn normalize_time(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|time| time.with_nanosecond(0))
        .unwrap_or(time)
}

fn normalize_times(times: impl IntoIterator<Item = NaiveTime>) -> BTreeSet<NaiveTime> {
    times.into_iter().map(normalize_time).collect()
}

impl Schedule {
    pub fn simple(
        date: NaiveDate,
        time: NaiveTime,
        alert_times: impl IntoIterator<Item = NaiveTime>,
    ) -> Self {
        Self::Simple(SimpleSchedule {
            date,
            time: normalize_time(time),
            alert_times: normalize_times(alert_times),
        })
    }

    /// Builds a recurring schedule, rejecting rules that cannot be expanded.
    ///
    /// A weekly rule with no days fires on the start date's weekday.
    pub fn advanced(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        time: NaiveTime,
        alert_times: impl IntoIterator<Item = NaiveTime>,
        recurrence: Recurrence,
    ) -> Result<Self, ScheduleError> {
        if let Some(end) = end_date {
            if end < start_date {
                return Err(ScheduleError::EndBeforeStart {
                    start: start_date,
                    end,
                });
            }
        }

        recurrence.validate()?;
        let recurrence = match recurrence {
            Recurrence::Weekly { days } if days.is_empty() => Recurrence::Weekly {
                days: WeekdaySet::single(start_date.weekday()),
            },
            other => other,
        };

        Ok(Self::Advanced(AdvancedSchedule {
            start_date,
            end_date,
            time: normalize_time(time),
            alert_times: normalize_times(alert_times),
            recurrence,
        }))
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced(_))
    }

    pub fn anchor(&self) -> NaiveDate {
        match self {
            Self::Simple(schedule) => schedule.date,
            Self::Advanced(schedule) => schedule.start_date,
        }
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Simple(schedule) => Some(schedule.date),
            Self::Advanced(schedule) => schedule.end_date,
        }
    }

    pub fn time(&self) -> NaiveTime {
        match self {
            Self::Simple(schedule) => schedule.time,
            Self::Advanced(schedule) => schedule.time,
        }
    }

    pub fn alert_times(&self) -> &BTreeSet<NaiveTime> {
        match self {
            Self::Simple(schedule) => &schedule.alert_times,
            Self::Advanced(schedule) => &schedule.alert_times,
        }
    }

    pub fn recurrence(&self) -> &Recurrence {
        match self {
            Self::Simple(_) => &Recurrence::None,
            Self::Advanced(schedule) => &schedule.recurrence,
        }
    }

    /// The primary time together with every alert time, sorted and deduplicated.
    pub fn trigger_times(&self) -> Vec<NaiveTime> {
        let mut times = self.alert_times().clone();
        times.insert(self.time());
        times.into_iter().collect()
    }

    pub fn next_occurrence_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let next = self.recurrence().next_on_or_after(self.anchor(), date)?;
        match self.end_date() {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    pub fn occurrences(&self) -> Occurrences<'_> {
        self.occurrences_from(self.anchor())
    }

    /// Occurrences resumed at the first one on or after `date`.
    pub fn occurrences_from(&self, date: NaiveDate) -> Occurrences<'_> {
        Occurrences::new(self, date)
    }

    /// Trigger instants within `[from, to)`, in chronological order.
    pub fn triggers(&self, from: NaiveDateTime, to: NaiveDateTime) -> Triggers<'_> {
        Triggers::new(self, from, to)
    }
}
