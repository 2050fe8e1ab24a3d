use chrono::{Datelike, Months, NaiveDate, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use super::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Days,
    Weeks,
    Months,
}

/// Which weekday of the month a monthly-by-weekday rule picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekOfMonth {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl WeekOfMonth {
    pub fn from_index(index: i64) -> Result<Self, ScheduleError> {
        match index {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            4 => Ok(Self::Fourth),
            -1 => Ok(Self::Last),
            other => Err(ScheduleError::InvalidWeekNumber(other)),
        }
    }

    pub fn index(self) -> i64 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
            Self::Last => -1,
        }
    }
}

/// Weekday from its index, 0 being Sunday and 6 Saturday.
pub fn weekday_from_index(index: i64) -> Result<Weekday, ScheduleError> {
    match index {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        other => Err(ScheduleError::InvalidWeekday(other)),
    }
}

pub fn weekday_index(weekday: Weekday) -> i64 {
    weekday.num_days_from_sunday() as i64
}

/// Set of weekdays, one bit per day starting from Sunday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn single(weekday: Weekday) -> Self {
        let mut set = Self::default();
        set.insert(weekday);
        set
    }

    pub fn insert(&mut self, weekday: Weekday) {
        self.0 |= 1 << weekday.num_days_from_sunday();
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members ordered Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (0..7)
            .filter_map(|i| weekday_from_index(i).ok())
            .filter(|weekday| self.contains(*weekday))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut set = Self::default();
        for weekday in iter {
            set.insert(weekday);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    None,
    Daily,
    Weekly { days: WeekdaySet },
    /// Day of month. Months shorter than `day` fire on their last day.
    MonthlyByDate { day: u32 },
    MonthlyByWeekday { week: WeekOfMonth, weekday: Weekday },
    /// Anchor month and day. A February 29 anchor fires on the 28th in common years.
    Yearly,
    Custom { interval: u32, unit: IntervalUnit },
}

impl Recurrence {
    pub(super) fn validate(&self) -> Result<(), ScheduleError> {
        match *self {
            Self::MonthlyByDate { day } if !(1..=31).contains(&day) => {
                Err(ScheduleError::InvalidMonthlyDate(day as i64))
            }
            Self::Custom { interval: 0, .. } => Err(ScheduleError::InvalidInterval(0)),
            _ => Ok(()),
        }
    }

    pub fn frequency_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly { .. } => "weekly",
            Self::MonthlyByDate { .. } | Self::MonthlyByWeekday { .. } => "monthly",
            Self::Yearly => "yearly",
            Self::Custom { .. } => "custom",
        }
    }

    /// First date on or after both `anchor` and `date` on which the rule fires.
    ///
    /// Returns `None` when the rule never fires again or the calendar overflows.
    pub fn next_on_or_after(&self, anchor: NaiveDate, date: NaiveDate) -> Option<NaiveDate> {
        let start = anchor.max(date);
        match *self {
            Self::None => (anchor >= start).then_some(anchor),
            Self::Daily => Some(start),
            Self::Weekly { days } => start
                .iter_days()
                .take(7)
                .find(|candidate| days.contains(candidate.weekday())),
            Self::MonthlyByDate { day } => first_monthly_on_or_after(start, |year, month| {
                clamped_date(year, month, day)
            }),
            Self::MonthlyByWeekday { week, weekday } => {
                first_monthly_on_or_after(start, |year, month| {
                    nth_weekday_of_month(year, month, week, weekday)
                })
            }
            Self::Yearly => (start.year()..=start.year().checked_add(1)?)
                .filter_map(|year| clamped_date(year, anchor.month(), anchor.day()))
                .find(|candidate| *candidate >= start),
            Self::Custom {
                interval,
                unit: IntervalUnit::Days,
            } => step_days_on_or_after(anchor, start, interval as i64),
            Self::Custom {
                interval,
                unit: IntervalUnit::Weeks,
            } => step_days_on_or_after(anchor, start, interval as i64 * 7),
            Self::Custom {
                interval,
                unit: IntervalUnit::Months,
            } => step_months_on_or_after(anchor, start, interval),
        }
    }
}

/// Tries the month of `start` and the one after it.
fn first_monthly_on_or_after(
    start: NaiveDate,
    candidate_in: impl Fn(i32, u32) -> Option<NaiveDate>,
) -> Option<NaiveDate> {
    let (next_year, next_month) = if start.month() == 12 {
        (start.year().checked_add(1)?, 1)
    } else {
        (start.year(), start.month() + 1)
    };

    [(start.year(), start.month()), (next_year, next_month)]
        .into_iter()
        .filter_map(|(year, month)| candidate_in(year, month))
        .find(|candidate| *candidate >= start)
}

fn step_days_on_or_after(anchor: NaiveDate, start: NaiveDate, step: i64) -> Option<NaiveDate> {
    let elapsed = (start - anchor).num_days();
    let steps = (elapsed + step - 1) / step;
    let offset = TimeDelta::try_days(steps.checked_mul(step)?)?;
    anchor.checked_add_signed(offset)
}

fn step_months_on_or_after(anchor: NaiveDate, start: NaiveDate, interval: u32) -> Option<NaiveDate> {
    let elapsed_months = (start.year() as i64 - anchor.year() as i64) * 12 + start.month() as i64
        - anchor.month() as i64;
    let first_step = (elapsed_months.max(0) as u64) / interval as u64;

    (first_step..first_step + 2)
        .filter_map(|step| {
            let months = u32::try_from(step * interval as u64).ok()?;
            anchor.checked_add_months(Months::new(months))
        })
        .find(|candidate| *candidate >= start)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let last = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()?;
    Some(last.day())
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn nth_weekday_of_month(
    year: i32,
    month: u32,
    week: WeekOfMonth,
    weekday: Weekday,
) -> Option<NaiveDate> {
    match week {
        WeekOfMonth::Last => {
            let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?;
            let back = (7 + last.weekday().num_days_from_sunday()
                - weekday.num_days_from_sunday())
                % 7;
            last.checked_sub_signed(TimeDelta::days(back as i64))
        }
        week => NaiveDate::from_weekday_of_month_opt(year, month, weekday, week.index() as u8),
    }
}
