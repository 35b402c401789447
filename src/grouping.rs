use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

use crate::dates::PayPeriod;
use crate::models::{EntryStatus, TimeEntry, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(EntryStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: EntryStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => *expected == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        value.parse::<EntryStatus>().map(StatusFilter::Only)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySlot {
    pub date: NaiveDate,
    pub hours: f64,
    pub project: Option<String>,
    pub status: Option<EntryStatus>,
    pub entry_id: Option<String>,
}

impl DaySlot {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            hours: 0.0,
            project: None,
            status: None,
            entry_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayPeriodGroup {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub pay_period_key: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub entries: Vec<TimeEntry>,
    pub total_hours: f64,
    pub days: Vec<DaySlot>,
}

impl PayPeriodGroup {
    pub fn period(&self) -> PayPeriod {
        PayPeriod::containing(self.week_start)
    }

    pub fn per_day_hours(&self) -> [f64; 7] {
        let mut hours = [0.0; 7];
        for (slot, day) in hours.iter_mut().zip(&self.days) {
            *slot = day.hours;
        }
        hours
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.id.clone()).collect()
    }
}

fn build_group(
    user_id: &str,
    period: PayPeriod,
    entries: Vec<TimeEntry>,
    users: &HashMap<&str, &User>,
) -> PayPeriodGroup {
    let mut days: Vec<DaySlot> = period.days().map(DaySlot::empty).collect();
    for entry in &entries {
        // Several entries on one day: the later one in iteration order wins.
        if let Some(slot) = days.iter_mut().find(|slot| slot.date == entry.date) {
            slot.hours = entry.hours;
            slot.project = Some(entry.project.clone());
            slot.status = Some(entry.status);
            slot.entry_id = Some(entry.id.clone());
        }
    }

    let total_hours = entries.iter().map(|entry| entry.hours).sum();
    let owner = users.get(user_id);

    PayPeriodGroup {
        user_id: user_id.to_string(),
        user_name: owner
            .map(|user| user.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        user_email: owner
            .map(|user| user.email.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        pay_period_key: period.key(),
        week_start: period.start(),
        week_end: period.end(),
        entries,
        total_hours,
        days,
    }
}

fn index_users(users: &[User]) -> HashMap<&str, &User> {
    users.iter().map(|user| (user.id.as_str(), user)).collect()
}

fn sort_for_display(groups: &mut [PayPeriodGroup]) {
    groups.sort_by(|a, b| {
        b.week_end
            .cmp(&a.week_end)
            .then_with(|| a.user_name.cmp(&b.user_name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

pub fn group_pay_period(
    entries: &[TimeEntry],
    period: PayPeriod,
    filter: StatusFilter,
    users: &[User],
) -> Vec<PayPeriodGroup> {
    let users = index_users(users);
    let mut by_user: HashMap<&str, Vec<TimeEntry>> = HashMap::new();

    for entry in entries {
        if !period.contains(entry.date) || !filter.matches(entry.status) {
            continue;
        }
        by_user
            .entry(entry.user_id.as_str())
            .or_default()
            .push(entry.clone());
    }

    let mut groups: Vec<PayPeriodGroup> = by_user
        .into_iter()
        .map(|(user_id, entries)| build_group(user_id, period, entries, &users))
        .collect();
    sort_for_display(&mut groups);
    groups
}

pub fn group_pay_periods(
    entries: &[TimeEntry],
    filter: StatusFilter,
    users: &[User],
) -> Vec<PayPeriodGroup> {
    let users = index_users(users);
    let mut buckets: HashMap<(&str, PayPeriod), Vec<TimeEntry>> = HashMap::new();

    for entry in entries {
        if !filter.matches(entry.status) {
            continue;
        }
        let key = (entry.user_id.as_str(), PayPeriod::containing(entry.date));
        buckets.entry(key).or_default().push(entry.clone());
    }

    let mut groups: Vec<PayPeriodGroup> = buckets
        .into_iter()
        .map(|((user_id, period), entries)| build_group(user_id, period, entries, &users))
        .collect();
    sort_for_display(&mut groups);
    groups
}

pub fn pending_pay_periods(entries: &[TimeEntry], users: &[User]) -> Vec<PayPeriodGroup> {
    group_pay_periods(entries, StatusFilter::Only(EntryStatus::Submitted), users)
}
