use crate::error::StoreError;
use crate::models::{EntryPatch, NewEntry, NewProject, NewUser, Project, TimeEntry, User};

pub mod json;
pub mod supabase;

pub trait Store: Send + Sync {
    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn all_users(&self) -> Result<Vec<User>, StoreError>;
    fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    fn delete_user(&self, id: &str) -> Result<bool, StoreError>;

    fn find_entry_by_id(&self, id: &str) -> Result<Option<TimeEntry>, StoreError>;
    fn find_entries_by_user_id(&self, user_id: &str) -> Result<Vec<TimeEntry>, StoreError>;
    fn all_entries(&self) -> Result<Vec<TimeEntry>, StoreError>;
    fn create_entry(&self, entry: NewEntry) -> Result<TimeEntry, StoreError>;
    fn update_entry(&self, id: &str, patch: &EntryPatch) -> Result<Option<TimeEntry>, StoreError>;
    fn delete_entry(&self, id: &str) -> Result<bool, StoreError>;

    fn all_projects(&self) -> Result<Vec<Project>, StoreError>;
    fn create_project(&self, project: NewProject) -> Result<Project, StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        (**self).find_user_by_id(id)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        (**self).find_user_by_email(email)
    }

    fn all_users(&self) -> Result<Vec<User>, StoreError> {
        (**self).all_users()
    }

    fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        (**self).create_user(user)
    }

    fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        (**self).delete_user(id)
    }

    fn find_entry_by_id(&self, id: &str) -> Result<Option<TimeEntry>, StoreError> {
        (**self).find_entry_by_id(id)
    }

    fn find_entries_by_user_id(&self, user_id: &str) -> Result<Vec<TimeEntry>, StoreError> {
        (**self).find_entries_by_user_id(user_id)
    }

    fn all_entries(&self) -> Result<Vec<TimeEntry>, StoreError> {
        (**self).all_entries()
    }

    fn create_entry(&self, entry: NewEntry) -> Result<TimeEntry, StoreError> {
        (**self).create_entry(entry)
    }

    fn update_entry(&self, id: &str, patch: &EntryPatch) -> Result<Option<TimeEntry>, StoreError> {
        (**self).update_entry(id, patch)
    }

    fn delete_entry(&self, id: &str) -> Result<bool, StoreError> {
        (**self).delete_entry(id)
    }

    fn all_projects(&self) -> Result<Vec<Project>, StoreError> {
        (**self).all_projects()
    }

    fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        (**self).create_project(project)
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
