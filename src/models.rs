use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Employee,
    Contractor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Contractor => "contractor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "contractor" => Ok(Role::Contractor),
            "admin" => Ok(Role::Admin),
            _ => Err("Invalid role".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 4] = [
        EntryStatus::Draft,
        EntryStatus::Submitted,
        EntryStatus::Approved,
        EntryStatus::Rejected,
    ];

    pub fn effective(raw: Option<EntryStatus>) -> EntryStatus {
        raw.unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Submitted => "submitted",
            EntryStatus::Approved => "approved",
            EntryStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(EntryStatus::Draft),
            "submitted" => Ok(EntryStatus::Submitted),
            "approved" => Ok(EntryStatus::Approved),
            "rejected" => Ok(EntryStatus::Rejected),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

fn normalize_status<'de, D>(deserializer: D) -> Result<EntryStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<EntryStatus>::deserialize(deserializer)?;
    Ok(EntryStatus::effective(raw))
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub hours: f64,
    pub project: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "normalize_status")]
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub user_id: String,
    pub date: NaiveDate,
    pub hours: f64,
    pub project: String,
    pub description: String,
}

// None leaves a field untouched; Some(0.0) hours is a real update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
}

impl EntryPatch {
    pub fn status(status: EntryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.hours.is_none()
            && self.project.is_none()
            && self.description.is_none()
            && self.status.is_none()
    }

    pub fn apply(&self, entry: &mut TimeEntry) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(hours) = self.hours {
            entry.hours = hours;
        }
        if let Some(project) = &self.project {
            entry.project = project.clone();
        }
        if let Some(description) = &self.description {
            entry.description = description.clone();
        }
        if let Some(status) = self.status {
            entry.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

// Blank strings count as absent, except description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EntryForm {
    pub date: Option<String>,
    pub hours: Option<String>,
    pub project: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserForm {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectForm {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_status_reads_as_draft() {
        let json = r#"{
            "id": "1",
            "userId": "u1",
            "date": "2025-11-18",
            "hours": 8,
            "project": "Acme",
            "description": "",
            "createdAt": "2025-11-18T09:00:00.000Z"
        }"#;
        let entry: TimeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.status, EntryStatus::Draft);
    }

    #[test]
    fn null_status_reads_as_draft() {
        let json = r#"{
            "id": "1",
            "userId": "u1",
            "date": "2025-11-18",
            "hours": 8,
            "project": "Acme",
            "status": null,
            "createdAt": "2025-11-18T09:00:00.000Z"
        }"#;
        let entry: TimeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.status, EntryStatus::Draft);
        assert_eq!(entry.description, "");
    }

    #[test]
    fn effective_status_keeps_explicit_values() {
        for status in EntryStatus::ALL {
            assert_eq!(EntryStatus::effective(Some(status)), status);
        }
        assert_eq!(EntryStatus::effective(None), EntryStatus::Draft);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" contractor ".parse::<Role>().unwrap(), Role::Contractor);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn patch_applies_zero_hours() {
        let mut entry = TimeEntry {
            id: "1".to_string(),
            user_id: "u1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
            hours: 8.0,
            project: "Acme".to_string(),
            description: String::new(),
            status: EntryStatus::Submitted,
            created_at: Utc::now(),
        };
        let patch = EntryPatch {
            hours: Some(0.0),
            ..EntryPatch::default()
        };
        patch.apply(&mut entry);
        assert_eq!(entry.hours, 0.0);
        assert_eq!(entry.status, EntryStatus::Submitted);
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = EntryPatch::status(EntryStatus::Approved);
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"status":"approved"}"#);
    }
}
