use std::path::Path;

use anyhow::Context;

use super::{ReminderStorage, SeedReminder};

/// Loads a JSON array of reminder forms into `storage`.
///
/// Entries that fail validation are logged and skipped. Returns how many were inserted.
pub async fn seed_from_file(storage: &dyn ReminderStorage, path: &Path) -> anyhow::Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read seed file {}", path.display()))?;
    let entries: Vec<SeedReminder> = serde_json::from_str(&content)
        .with_context(|| format!("Could not parse seed file {}", path.display()))?;

    let mut inserted = 0;
    for entry in entries {
        let title = entry.form.title.clone();
        match entry.form.into_new_reminder(entry.owner) {
            Ok(reminder) => {
                storage.insert(reminder).await?;
                inserted += 1;
            }
            Err(error) => {
                log::warn!("Skipping invalid seed reminder. [title = {title}, error = {error}]")
            }
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use crate::storage::InMemoryReminderStorage;

    use super::*;

    #[tokio::test]
    async fn seeds_valid_entries_and_skips_invalid_ones() {
        let path = std::env::temp_dir().join(format!("reminders-seed-{}.json", std::process::id()));
        let content = r#"[
            {"owner": 1, "title": "Team lunch", "reminderDate": "2025-07-04", "reminderTime": "12:00"},
            {"owner": 2, "title": "Broken", "reminderDate": "2025-07-04", "reminderTime": "noon"},
            {"owner": 2, "title": "Timesheets", "startDate": "2025-07-01", "reminderTime": "17:00",
             "repeatFrequency": "weekly", "weeklyDays": [5], "isAdvanced": true}
        ]"#;
        tokio::fs::write(&path, content).await.unwrap();
        let storage = InMemoryReminderStorage::new();

        let inserted = seed_from_file(&storage, &path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(inserted, 2);
        let titles: Vec<_> = storage
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|reminder| reminder.title)
            .collect();
        assert_eq!(titles, vec!["Team lunch", "Timesheets"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let storage = InMemoryReminderStorage::new();

        let result = seed_from_file(&storage, Path::new("/nonexistent/reminders.json")).await;

        assert!(result.is_err());
    }
}
