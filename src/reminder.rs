use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

pub type ReminderId = i64;
pub type UserId = i64;

/// Access flag. It only decides who can see a reminder, never when it fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub owner: UserId,
    pub title: String,
    pub visibility: Visibility,
    pub schedule: Schedule,
}

impl Reminder {
    pub fn is_visible_to(&self, user: UserId) -> bool {
        self.owner == user || self.visibility == Visibility::Public
    }
}
