use serde::Deserialize;

use crate::form::ReminderForm;
use crate::reminder::{UserId, Visibility};
use crate::schedule::Schedule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub owner: UserId,
    pub title: String,
    pub visibility: Visibility,
    pub schedule: Schedule,
}

/// Entry of the seed file: a reminder form plus the user it belongs to.
#[derive(Deserialize, Debug)]
pub struct SeedReminder {
    pub owner: UserId,
    #[serde(flatten)]
    pub form: ReminderForm,
}
