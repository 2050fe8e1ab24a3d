use thiserror::Error;

/// Reasons a reminder schedule is rejected at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("reminder title must not be empty")]
    EmptyTitle,

    #[error("missing anchor date: either reminderDate or startDate is required")]
    MissingAnchorDate,

    #[error("could not parse time {value:?}, expected HH:mm")]
    InvalidTime { value: String },

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("missing {field} for {frequency} recurrence")]
    MissingField {
        field: &'static str,
        frequency: &'static str,
    },

    #[error("monthly date must be between 1 and 31, got {0}")]
    InvalidMonthlyDate(i64),

    #[error("monthly week number must be 1-4 or -1 for the last week, got {0}")]
    InvalidWeekNumber(i64),

    #[error("weekday index must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidWeekday(i64),

    #[error("custom interval must be positive, got {0}")]
    InvalidInterval(i64),
}
