use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::StoreError;
use crate::models::{
    EntryPatch, EntryStatus, NewEntry, NewProject, NewUser, Project, TimeEntry, User,
};
use crate::store::{Store, new_id};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct Database {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    time_entries: Vec<TimeEntry>,
    #[serde(default)]
    projects: Vec<Project>,
}

impl Database {
    fn seeded() -> Self {
        Self {
            users: Vec::new(),
            time_entries: Vec::new(),
            projects: vec![Project {
                id: "1".to_string(),
                name: "General".to_string(),
                description: Some("General work hours".to_string()),
                created_at: Utc::now(),
            }],
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> Result<Database, StoreError> {
        if !self.path.exists() {
            let db = Database::seeded();
            self.write(&db)?;
            return Ok(db);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, db: &Database) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(db)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn view<T>(&self, f: impl FnOnce(&Database) -> T) -> Result<T, StoreError> {
        let _guard = self.guard();
        let db = self.read()?;
        Ok(f(&db))
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Database) -> T) -> Result<T, StoreError> {
        let _guard = self.guard();
        let mut db = self.read()?;
        let result = f(&mut db);
        self.write(&db)?;
        Ok(result)
    }
}

impl Store for JsonStore {
    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.view(|db| db.users.iter().find(|user| user.id == id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.view(|db| db.users.iter().find(|user| user.email == email).cloned())
    }

    fn all_users(&self) -> Result<Vec<User>, StoreError> {
        self.view(|db| db.users.clone())
    }

    fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: new_id(),
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: Utc::now(),
        };
        debug!(user_id = %user.id, "json store: create user");
        self.modify(|db| db.users.push(user.clone()))?;
        Ok(user)
    }

    fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        debug!(user_id = id, "json store: delete user");
        self.modify(|db| {
            let before = db.users.len();
            db.users.retain(|user| user.id != id);
            db.users.len() != before
        })
    }

    fn find_entry_by_id(&self, id: &str) -> Result<Option<TimeEntry>, StoreError> {
        self.view(|db| db.time_entries.iter().find(|entry| entry.id == id).cloned())
    }

    fn find_entries_by_user_id(&self, user_id: &str) -> Result<Vec<TimeEntry>, StoreError> {
        self.view(|db| {
            db.time_entries
                .iter()
                .filter(|entry| entry.user_id == user_id)
                .cloned()
                .collect()
        })
    }

    fn all_entries(&self) -> Result<Vec<TimeEntry>, StoreError> {
        self.view(|db| db.time_entries.clone())
    }

    fn create_entry(&self, entry: NewEntry) -> Result<TimeEntry, StoreError> {
        let entry = TimeEntry {
            id: new_id(),
            user_id: entry.user_id,
            date: entry.date,
            hours: entry.hours,
            project: entry.project,
            description: entry.description,
            status: EntryStatus::Draft,
            created_at: Utc::now(),
        };
        debug!(entry_id = %entry.id, "json store: create entry");
        self.modify(|db| db.time_entries.push(entry.clone()))?;
        Ok(entry)
    }

    fn update_entry(&self, id: &str, patch: &EntryPatch) -> Result<Option<TimeEntry>, StoreError> {
        debug!(entry_id = id, ?patch, "json store: update entry");
        self.modify(|db| {
            let entry = db.time_entries.iter_mut().find(|entry| entry.id == id)?;
            patch.apply(entry);
            Some(entry.clone())
        })
    }

    fn delete_entry(&self, id: &str) -> Result<bool, StoreError> {
        debug!(entry_id = id, "json store: delete entry");
        self.modify(|db| {
            let before = db.time_entries.len();
            db.time_entries.retain(|entry| entry.id != id);
            db.time_entries.len() != before
        })
    }

    fn all_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.view(|db| db.projects.clone())
    }

    fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let project = Project {
            id: new_id(),
            name: project.name,
            description: project.description,
            created_at: Utc::now(),
        };
        self.modify(|db| db.projects.push(project.clone()))?;
        Ok(project)
    }
}
