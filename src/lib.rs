pub mod appsettings;
pub mod form;
pub mod notifier;
pub mod reminder;
pub mod schedule;
pub mod storage;
