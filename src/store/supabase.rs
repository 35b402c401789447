use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::models::{
    EntryPatch, EntryStatus, NewEntry, NewProject, NewUser, Project, Role, TimeEntry, User,
};
use crate::store::{Store, new_id};

const USERS: &str = "timesheet_users";
const ENTRIES: &str = "timesheet_time_entries";
const PROJECTS: &str = "timesheet_projects";

#[derive(Debug, Deserialize, Serialize)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    #[serde(default)]
    role: Role,
    #[serde(default = "Utc::now", skip_serializing)]
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EntryRow {
    id: String,
    user_id: String,
    date: NaiveDate,
    #[serde(deserialize_with = "numeric")]
    hours: f64,
    project: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<EntryStatus>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl From<EntryRow> for TimeEntry {
    fn from(row: EntryRow) -> Self {
        TimeEntry {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            hours: row.hours,
            project: row.project,
            description: row.description.unwrap_or_default(),
            status: EntryStatus::effective(row.status),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct EntryInsert<'a> {
    id: &'a str,
    user_id: &'a str,
    date: NaiveDate,
    hours: f64,
    project: &'a str,
    description: &'a str,
    status: EntryStatus,
}

#[derive(Debug, Deserialize, Serialize)]
struct ProjectRow {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "Utc::now", skip_serializing)]
    created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

// numeric columns come back as either a JSON number or a string.
fn numeric<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Number(f64),
        Text(String),
    }

    match Numeric::deserialize(deserializer)? {
        Numeric::Number(value) => Ok(value),
        Numeric::Text(value) => value.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(url: &str, api_key: String) -> Result<Self, StoreError> {
        let client = Client::builder().user_agent("timesheet").build()?;
        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key,
        })
    }

    fn request(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, StoreError> {
        let url = reqwest::Url::parse_with_params(&format!("{}/{}", self.base_url, table), query)
            .map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation"))
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, StoreError> {
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Vec<T>>()?)
    }

    fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        order: Option<&str>,
    ) -> Result<Vec<T>, StoreError> {
        let mut query = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());
        if let Some(order) = order {
            query.push(("order", order.to_string()));
        }
        debug!(table, ?filters, "supabase: select");
        self.send(self.request(Method::GET, table, &query)?)
    }

    fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<T>, StoreError> {
        let rows = self.select(table, &[(column, eq(value))], None)?;
        Ok(rows.into_iter().next())
    }

    fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T, StoreError> {
        debug!(table, "supabase: insert");
        let rows = self.send(self.request(Method::POST, table, &[])?.json(body))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::MissingRow(table.to_string()))
    }

    fn delete_by_id(&self, table: &str, id: &str) -> Result<bool, StoreError> {
        debug!(table, id, "supabase: delete");
        let rows: Vec<serde_json::Value> =
            self.send(self.request(Method::DELETE, table, &[("id", eq(id))])?)?;
        Ok(!rows.is_empty())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl Store for SupabaseStore {
    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.select_one::<UserRow>(USERS, "id", id)?.map(User::from))
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.select_one::<UserRow>(USERS, "email", email)?.map(User::from))
    }

    fn all_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = self.select(USERS, &[], Some("created_at.desc"))?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = UserRow {
            id: new_id(),
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: Utc::now(),
        };
        Ok(self.insert::<_, UserRow>(USERS, &row)?.into())
    }

    fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_by_id(USERS, id)
    }

    fn find_entry_by_id(&self, id: &str) -> Result<Option<TimeEntry>, StoreError> {
        Ok(self.select_one::<EntryRow>(ENTRIES, "id", id)?.map(TimeEntry::from))
    }

    fn find_entries_by_user_id(&self, user_id: &str) -> Result<Vec<TimeEntry>, StoreError> {
        let rows: Vec<EntryRow> =
            self.select(ENTRIES, &[("user_id", eq(user_id))], Some("date.desc"))?;
        Ok(rows.into_iter().map(TimeEntry::from).collect())
    }

    fn all_entries(&self) -> Result<Vec<TimeEntry>, StoreError> {
        let rows: Vec<EntryRow> = self.select(ENTRIES, &[], Some("date.desc"))?;
        Ok(rows.into_iter().map(TimeEntry::from).collect())
    }

    fn create_entry(&self, entry: NewEntry) -> Result<TimeEntry, StoreError> {
        let id = new_id();
        let row = EntryInsert {
            id: &id,
            user_id: &entry.user_id,
            date: entry.date,
            hours: entry.hours,
            project: &entry.project,
            description: &entry.description,
            status: EntryStatus::Draft,
        };
        Ok(self.insert::<_, EntryRow>(ENTRIES, &row)?.into())
    }

    fn update_entry(&self, id: &str, patch: &EntryPatch) -> Result<Option<TimeEntry>, StoreError> {
        debug!(entry_id = id, ?patch, "supabase: update entry");
        let rows: Vec<EntryRow> =
            self.send(self.request(Method::PATCH, ENTRIES, &[("id", eq(id))])?.json(patch))?;
        Ok(rows.into_iter().next().map(TimeEntry::from))
    }

    fn delete_entry(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_by_id(ENTRIES, id)
    }

    fn all_projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows: Vec<ProjectRow> = self.select(PROJECTS, &[], Some("created_at.desc"))?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let row = ProjectRow {
            id: new_id(),
            name: project.name,
            description: project.description,
            created_at: Utc::now(),
        };
        Ok(self.insert::<_, ProjectRow>(PROJECTS, &row)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_rows_accept_string_hours_and_null_status() {
        let json = r#"{
            "id": "1",
            "user_id": "u1",
            "date": "2025-11-18",
            "hours": "7.50",
            "project": "Acme",
            "description": null,
            "status": null,
            "created_at": "2025-11-18T09:00:00.123456+00:00"
        }"#;
        let entry: TimeEntry = serde_json::from_str::<EntryRow>(json).unwrap().into();
        assert_eq!(entry.hours, 7.5);
        assert_eq!(entry.status, EntryStatus::Draft);
        assert_eq!(entry.description, "");
    }

    #[test]
    fn entry_rows_accept_numeric_hours() {
        let json = r#"{
            "id": "1",
            "user_id": "u1",
            "date": "2025-11-18",
            "hours": 0,
            "project": "Acme",
            "status": "rejected"
        }"#;
        let entry: TimeEntry = serde_json::from_str::<EntryRow>(json).unwrap().into();
        assert_eq!(entry.hours, 0.0);
        assert_eq!(entry.status, EntryStatus::Rejected);
    }

    #[test]
    fn status_patch_body_carries_status() {
        let body = serde_json::to_value(EntryPatch::status(EntryStatus::Submitted)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "submitted" }));
    }

    #[test]
    fn base_url_is_normalized() {
        let store = SupabaseStore::new("https://example.supabase.co/", "key".to_string()).unwrap();
        assert_eq!(store.base_url, "https://example.supabase.co/rest/v1");
        assert_eq!(eq("42"), "eq.42");
    }
}
