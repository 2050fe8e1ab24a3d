//! The flat reminder object exchanged with the web client.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::reminder::{Reminder, UserId, Visibility};
use crate::schedule::{
    IntervalUnit, Recurrence, Schedule, ScheduleError, WeekOfMonth, normalize_time,
    weekday_from_index, weekday_index,
};
use crate::storage::NewReminder;

const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatFrequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyType {
    Date,
    Weekday,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderForm {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub reminder_time: String,
    #[serde(default)]
    pub alert_times: Vec<String>,
    #[serde(default)]
    pub repeat_frequency: RepeatFrequency,
    #[serde(default)]
    pub weekly_days: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_type: Option<MonthlyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_week_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_week_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_interval_unit: Option<IntervalUnit>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_advanced: bool,
}

fn parse_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(normalize_time)
        .map_err(|_| ScheduleError::InvalidTime {
            value: value.to_string(),
        })
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn required<T>(
    value: Option<T>,
    field: &'static str,
    frequency: &'static str,
) -> Result<T, ScheduleError> {
    value.ok_or(ScheduleError::MissingField { field, frequency })
}

impl ReminderForm {
    pub fn new(title: impl Into<String>, visibility: Visibility, schedule: &Schedule) -> Self {
        let mut form = Self {
            title: title.into(),
            reminder_date: Some(schedule.anchor()),
            reminder_time: format_time(schedule.time()),
            alert_times: schedule.alert_times().iter().copied().map(format_time).collect(),
            visibility,
            ..Default::default()
        };

        if let Schedule::Advanced(advanced) = schedule {
            form.is_advanced = true;
            form.start_date = Some(advanced.start_date);
            form.end_date = advanced.end_date;
            form.write_recurrence(&advanced.recurrence);
        }

        form
    }

    fn write_recurrence(&mut self, recurrence: &Recurrence) {
        self.repeat_frequency = match *recurrence {
            Recurrence::None => RepeatFrequency::None,
            Recurrence::Daily => RepeatFrequency::Daily,
            Recurrence::Weekly { days } => {
                self.weekly_days = days.iter().map(weekday_index).collect();
                RepeatFrequency::Weekly
            }
            Recurrence::MonthlyByDate { day } => {
                self.monthly_type = Some(MonthlyType::Date);
                self.monthly_date = Some(day as i64);
                RepeatFrequency::Monthly
            }
            Recurrence::MonthlyByWeekday { week, weekday } => {
                self.monthly_type = Some(MonthlyType::Weekday);
                self.monthly_week_number = Some(week.index());
                self.monthly_week_day = Some(weekday_index(weekday));
                RepeatFrequency::Monthly
            }
            Recurrence::Yearly => RepeatFrequency::Yearly,
            Recurrence::Custom { interval, unit } => {
                self.custom_interval = Some(interval as i64);
                self.custom_interval_unit = Some(unit);
                RepeatFrequency::Custom
            }
        };
    }

    pub fn to_schedule(&self) -> Result<Schedule, ScheduleError> {
        let time = parse_time(&self.reminder_time)?;
        let alert_times = self
            .alert_times
            .iter()
            .map(|value| parse_time(value))
            .collect::<Result<Vec<_>, _>>()?;

        if !self.is_advanced {
            if self.has_advanced_fields() {
                log::debug!(
                    "Ignoring advanced-only fields of simple reminder. [title = {}]",
                    self.title
                );
            }
            let date = self.reminder_date.ok_or(ScheduleError::MissingAnchorDate)?;
            if self.repeat_frequency == RepeatFrequency::None {
                return Ok(Schedule::simple(date, time, alert_times));
            }
            // A repeating simple reminder starts on its date and never ends.
            return Schedule::advanced(date, None, time, alert_times, self.parse_recurrence()?);
        }

        let start_date = self
            .start_date
            .or(self.reminder_date)
            .ok_or(ScheduleError::MissingAnchorDate)?;

        Schedule::advanced(
            start_date,
            self.end_date,
            time,
            alert_times,
            self.parse_recurrence()?,
        )
    }

    fn has_advanced_fields(&self) -> bool {
        self.start_date.is_some()
            || self.end_date.is_some()
            || !self.weekly_days.is_empty()
            || self.custom_interval.is_some()
    }

    fn advanced_only<T>(&self, value: T) -> Option<T> {
        self.is_advanced.then_some(value)
    }

    fn parse_recurrence(&self) -> Result<Recurrence, ScheduleError> {
        let recurrence = match self.repeat_frequency {
            RepeatFrequency::None => Recurrence::None,
            RepeatFrequency::Daily => Recurrence::Daily,
            RepeatFrequency::Yearly => Recurrence::Yearly,
            RepeatFrequency::Weekly => Recurrence::Weekly {
                days: self
                    .advanced_only(&self.weekly_days[..])
                    .unwrap_or_default()
                    .iter()
                    .map(|index| weekday_from_index(*index))
                    .collect::<Result<_, _>>()?,
            },
            RepeatFrequency::Monthly => {
                match required(self.monthly_type, "monthlyType", "monthly")? {
                    MonthlyType::Date => {
                        let day = required(self.monthly_date, "monthlyDate", "monthly")?;
                        if !(1..=31).contains(&day) {
                            return Err(ScheduleError::InvalidMonthlyDate(day));
                        }
                        Recurrence::MonthlyByDate { day: day as u32 }
                    }
                    MonthlyType::Weekday => Recurrence::MonthlyByWeekday {
                        week: WeekOfMonth::from_index(required(
                            self.monthly_week_number,
                            "monthlyWeekNumber",
                            "monthly",
                        )?)?,
                        weekday: weekday_from_index(required(
                            self.monthly_week_day,
                            "monthlyWeekDay",
                            "monthly",
                        )?)?,
                    },
                }
            }
            RepeatFrequency::Custom => {
                let interval = required(
                    self.advanced_only(self.custom_interval).flatten(),
                    "customInterval",
                    "custom",
                )?;
                let unit = required(self.custom_interval_unit, "customIntervalUnit", "custom")?;
                let interval = u32::try_from(interval)
                    .ok()
                    .filter(|interval| *interval > 0)
                    .ok_or(ScheduleError::InvalidInterval(interval))?;
                Recurrence::Custom { interval, unit }
            }
        };

        Ok(recurrence)
    }

    pub fn into_new_reminder(self, owner: UserId) -> Result<NewReminder, ScheduleError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ScheduleError::EmptyTitle);
        }

        Ok(NewReminder {
            owner,
            title: title.to_string(),
            visibility: self.visibility,
            schedule: self.to_schedule()?,
        })
    }
}

impl From<&Reminder> for ReminderForm {
    fn from(reminder: &Reminder) -> Self {
        Self::new(reminder.title.clone(), reminder.visibility, &reminder.schedule)
    }
}
