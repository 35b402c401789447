use serde::Serialize;
use std::collections::HashMap;

use crate::models::{EntryStatus, TimeEntry, User};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRollup {
    pub user_id: String,
    pub name: String,
    pub hours: f64,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatusCounts {
    pub draft: usize,
    pub submitted: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    fn record(&mut self, status: EntryStatus) {
        match status {
            EntryStatus::Draft => self.draft += 1,
            EntryStatus::Submitted => self.submitted += 1,
            EntryStatus::Approved => self.approved += 1,
            EntryStatus::Rejected => self.rejected += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Overview {
    pub total_hours: f64,
    pub total_users: usize,
    pub total_entries: usize,
    pub by_status: StatusCounts,
    pub by_user: Vec<UserRollup>,
}

pub fn build_overview(entries: &[TimeEntry], users: &[User]) -> Overview {
    let names: HashMap<&str, &str> = users
        .iter()
        .map(|user| (user.id.as_str(), user.name.as_str()))
        .collect();

    let mut by_user: HashMap<&str, UserRollup> = HashMap::new();
    let mut by_status = StatusCounts::default();

    for entry in entries {
        by_status.record(entry.status);
        let rollup = by_user
            .entry(entry.user_id.as_str())
            .or_insert_with(|| UserRollup {
                user_id: entry.user_id.clone(),
                name: names
                    .get(entry.user_id.as_str())
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
                hours: 0.0,
                entries: 0,
            });
        rollup.hours += entry.hours;
        rollup.entries += 1;
    }

    let mut by_user: Vec<UserRollup> = by_user.into_values().collect();
    by_user.sort_by(|a, b| {
        b.hours
            .total_cmp(&a.hours)
            .then_with(|| a.name.cmp(&b.name))
    });

    Overview {
        total_hours: entries.iter().map(|entry| entry.hours).sum(),
        total_users: users.len(),
        total_entries: entries.len(),
        by_status,
        by_user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::{NaiveDate, Utc};

    fn entry(user_id: &str, hours: f64, status: EntryStatus) -> TimeEntry {
        TimeEntry {
            id: format!("{user_id}-{hours}"),
            user_id: user_id.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            hours,
            project: "General".to_string(),
            description: String::new(),
            status,
            created_at: Utc::now(),
        }
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            name: name.to_string(),
            role: Role::Employee,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn overview_totals_and_ordering() {
        let users = vec![user("u1", "Ann"), user("u2", "Bob"), user("u3", "Cy")];
        let entries = vec![
            entry("u1", 4.0, EntryStatus::Draft),
            entry("u2", 8.0, EntryStatus::Submitted),
            entry("u2", 7.5, EntryStatus::Approved),
            entry("u1", 2.0, EntryStatus::Rejected),
        ];

        let overview = build_overview(&entries, &users);

        assert_eq!(overview.total_hours, 21.5);
        assert_eq!(overview.total_users, 3);
        assert_eq!(overview.total_entries, 4);
        assert_eq!(overview.by_user.len(), 2);
        assert_eq!(overview.by_user[0].name, "Bob");
        assert_eq!(overview.by_user[0].entries, 2);
        assert_eq!(overview.by_user[1].hours, 6.0);
        assert_eq!(overview.by_status.submitted, 1);
        assert_eq!(overview.by_status.rejected, 1);
    }

    #[test]
    fn orphaned_entries_are_labelled_unknown() {
        let overview = build_overview(&[entry("gone", 1.0, EntryStatus::Draft)], &[]);
        assert_eq!(overview.by_user[0].name, "Unknown");
        assert_eq!(overview.total_users, 0);
    }
}
