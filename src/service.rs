use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::bulk::{self, BulkApproval};
use crate::dates::PayPeriod;
use crate::error::{Result, StoreError, TimesheetError};
use crate::grouping::{self, PayPeriodGroup, StatusFilter};
use crate::lifecycle;
use crate::models::{
    EntryForm, EntryPatch, EntryStatus, NewProject, NewUser, Project, ProjectForm, Role,
    TimeEntry, User, UserForm,
};
use crate::policy::{Action, Caller, authorize};
use crate::rollups::{self, Overview};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedEntry {
    #[serde(flatten)]
    pub entry: TimeEntry,
    pub user_name: String,
    pub user_email: String,
    pub user_role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedUser {
    pub user: User,
    pub entries_deleted: usize,
    pub message: String,
}

pub struct Timesheet<S> {
    store: S,
}

impl<S: Store> Timesheet<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn caller(&self, caller_id: &str) -> Result<Caller> {
        let user = store_op("resolve caller", self.store.find_user_by_id(caller_id))?
            .ok_or_else(|| TimesheetError::Unauthenticated("User not found".to_string()))?;
        Ok(Caller::from(&user))
    }

    fn entry(&self, entry_id: &str) -> Result<TimeEntry> {
        store_op("find entry", self.store.find_entry_by_id(entry_id))?
            .ok_or_else(|| TimesheetError::not_found("Entry not found"))
    }

    fn users(&self) -> Result<Vec<User>> {
        store_op("list users", self.store.all_users())
    }

    fn all_entries(&self) -> Result<Vec<TimeEntry>> {
        store_op("list entries", self.store.all_entries())
    }

    fn entries_of(&self, user_id: &str) -> Result<Vec<TimeEntry>> {
        store_op("list user entries", self.store.find_entries_by_user_id(user_id))
    }

    pub fn create_entry(&self, caller_id: &str, form: &EntryForm) -> Result<TimeEntry> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::CreateEntry)?;
        let entry = lifecycle::new_entry(&caller.id, form)?;
        let entry = store_op("create entry", self.store.create_entry(entry))?;
        info!(entry_id = %entry.id, user_id = %caller.id, "entry created");
        Ok(entry)
    }

    pub fn list_own_entries(&self, caller_id: &str) -> Result<Vec<TimeEntry>> {
        let caller = self.caller(caller_id)?;
        let mut entries = self.entries_of(&caller.id)?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    pub fn get_entry(&self, caller_id: &str, entry_id: &str) -> Result<TimeEntry> {
        let caller = self.caller(caller_id)?;
        let entry = self.entry(entry_id)?;
        authorize(&caller, Action::ReadEntry { owner: &entry.user_id })?;
        Ok(entry)
    }

    pub fn update_entry(&self, caller_id: &str, entry_id: &str, form: &EntryForm) -> Result<TimeEntry> {
        let caller = self.caller(caller_id)?;
        let entry = self.entry(entry_id)?;
        authorize(&caller, Action::EditEntry { owner: &entry.user_id })?;
        lifecycle::check_edit(&entry, caller.is_admin())?;

        let mut patch = lifecycle::edit_patch(form)?;
        patch.status = lifecycle::status_after_edit(entry.status, caller.is_admin());
        if let Some(status) = patch.status {
            info!(entry_id, from = %entry.status, to = %status, "owner edit resets entry");
        }

        store_op("update entry", self.store.update_entry(entry_id, &patch))?
            .ok_or_else(|| TimesheetError::not_found("Entry not found. It may have been deleted."))
    }

    pub fn delete_entry(&self, caller_id: &str, entry_id: &str) -> Result<()> {
        let caller = self.caller(caller_id)?;
        let entry = self.entry(entry_id)?;
        authorize(&caller, Action::DeleteEntry { owner: &entry.user_id })?;
        if !store_op("delete entry", self.store.delete_entry(entry_id))? {
            return Err(TimesheetError::not_found("Entry not found"));
        }
        info!(entry_id, by = %caller.id, "entry deleted");
        Ok(())
    }

    pub fn submit_entry(&self, caller_id: &str, entry_id: &str) -> Result<TimeEntry> {
        let caller = self.caller(caller_id)?;
        let entry = self.entry(entry_id)?;
        authorize(&caller, Action::SubmitEntry { owner: &entry.user_id })?;
        lifecycle::check_submit(&entry)?;
        self.set_status(entry_id, EntryStatus::Submitted)
    }

    pub fn approve_entry(&self, caller_id: &str, entry_id: &str) -> Result<TimeEntry> {
        self.review(caller_id, entry_id, EntryStatus::Approved)
    }

    pub fn reject_entry(&self, caller_id: &str, entry_id: &str) -> Result<TimeEntry> {
        self.review(caller_id, entry_id, EntryStatus::Rejected)
    }

    // Single-entry review does not look at the current status.
    fn review(&self, caller_id: &str, entry_id: &str, status: EntryStatus) -> Result<TimeEntry> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ReviewEntry)?;
        self.entry(entry_id)?;
        self.set_status(entry_id, status)
    }

    fn set_status(&self, entry_id: &str, status: EntryStatus) -> Result<TimeEntry> {
        let patch = EntryPatch::status(status);
        let updated = store_op("update entry status", self.store.update_entry(entry_id, &patch))?
            .ok_or_else(|| TimesheetError::not_found("Entry not found"))?;
        info!(entry_id, %status, "entry status changed");
        Ok(updated)
    }

    pub fn bulk_approve(&self, caller_id: &str, entry_ids: &[String]) -> Result<BulkApproval> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::BulkApprove)?;
        if entry_ids.is_empty() {
            return Err(TimesheetError::validation(
                "entryIds must be a non-empty array",
            ));
        }
        Ok(bulk::approve_submitted(&self.store, entry_ids))
    }

    pub fn approve_pay_period(
        &self,
        caller_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<BulkApproval> {
        let pending = StatusFilter::Only(EntryStatus::Submitted);
        let group = self
            .pay_period(caller_id, date, pending)?
            .into_iter()
            .find(|group| group.user_id == user_id)
            .ok_or_else(|| TimesheetError::not_found("No submitted entries in this pay period"))?;
        self.bulk_approve(caller_id, &group.entry_ids())
    }

    pub fn list_all_entries(&self, caller_id: &str) -> Result<Vec<EnrichedEntry>> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ListAll)?;
        let users = self.users()?;
        let mut entries = self.all_entries()?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(entries
            .into_iter()
            .map(|entry| {
                let owner = users.iter().find(|user| user.id == entry.user_id);
                EnrichedEntry {
                    user_name: owner.map_or_else(|| "Unknown".to_string(), |u| u.name.clone()),
                    user_email: owner.map_or_else(|| "Unknown".to_string(), |u| u.email.clone()),
                    user_role: owner.map_or_else(|| "Unknown".to_string(), |u| u.role.to_string()),
                    entry,
                }
            })
            .collect())
    }

    pub fn list_users(&self, caller_id: &str) -> Result<Vec<User>> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ListAll)?;
        self.users()
    }

    pub fn create_user(&self, caller_id: &str, form: &UserForm) -> Result<User> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ManageUsers)?;
        self.insert_user(form)
    }

    pub fn bootstrap_admin(&self, form: &UserForm) -> Result<User> {
        if self.users()?.iter().any(User::is_admin) {
            return Err(TimesheetError::forbidden("An admin account already exists"));
        }
        let form = UserForm {
            role: Some(Role::Admin.to_string()),
            ..form.clone()
        };
        self.insert_user(&form)
    }

    fn insert_user(&self, form: &UserForm) -> Result<User> {
        let email = form.email.as_deref().map(str::trim).unwrap_or_default();
        let name = form.name.as_deref().map(str::trim).unwrap_or_default();
        if email.is_empty() || name.is_empty() {
            return Err(TimesheetError::validation("Name and email are required"));
        }
        let role = match form.role.as_deref().map(str::trim) {
            Some(role) if !role.is_empty() => role.parse::<Role>().map_err(TimesheetError::Validation)?,
            _ => Role::default(),
        };
        if store_op("find user by email", self.store.find_user_by_email(email))?.is_some() {
            return Err(TimesheetError::validation("Email already registered"));
        }

        let user = store_op(
            "create user",
            self.store.create_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                role,
            }),
        )?;
        info!(user_id = %user.id, %role, "user created");
        Ok(user)
    }

    pub fn delete_user(&self, caller_id: &str, user_id: &str) -> Result<DeletedUser> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::DeleteUser { target: user_id })?;
        let user = store_op("find user", self.store.find_user_by_id(user_id))?
            .ok_or_else(|| TimesheetError::not_found("User not found"))?;

        // Not transactional: entries whose delete fails stay behind.
        let entries = self.entries_of(user_id)?;
        let mut entries_deleted = 0;
        for entry in &entries {
            match self.store.delete_entry(&entry.id) {
                Ok(true) => entries_deleted += 1,
                Ok(false) => warn!(entry_id = %entry.id, "cascade: entry already gone"),
                Err(err) => warn!(entry_id = %entry.id, error = %err, "cascade: entry delete failed"),
            }
        }

        if !store_op("delete user", self.store.delete_user(user_id))? {
            return Err(TimesheetError::not_found("User not found"));
        }

        info!(user_id, entries = entries_deleted, "user deleted");
        Ok(DeletedUser {
            message: format!(
                "User {} and {} time entries deleted successfully",
                user.name, entries_deleted
            ),
            user,
            entries_deleted,
        })
    }

    pub fn list_projects(&self, caller_id: &str) -> Result<Vec<Project>> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ListProjects)?;
        store_op("list projects", self.store.all_projects())
    }

    pub fn create_project(&self, caller_id: &str, form: &ProjectForm) -> Result<Project> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ManageProjects)?;
        let name = form.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(TimesheetError::validation("Project name is required"));
        }
        let description = form
            .description
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        store_op(
            "create project",
            self.store.create_project(NewProject {
                name: name.to_string(),
                description,
            }),
        )
    }

    pub fn my_pay_periods(&self, caller_id: &str) -> Result<Vec<PayPeriodGroup>> {
        let caller = self.caller(caller_id)?;
        let entries = self.entries_of(&caller.id)?;
        let users: Vec<User> = store_op("find user", self.store.find_user_by_id(&caller.id))?
            .into_iter()
            .collect();
        Ok(grouping::group_pay_periods(&entries, StatusFilter::All, &users))
    }

    pub fn pay_period(
        &self,
        caller_id: &str,
        date: NaiveDate,
        filter: StatusFilter,
    ) -> Result<Vec<PayPeriodGroup>> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ListAll)?;
        let entries = self.all_entries()?;
        let users = self.users()?;
        Ok(grouping::group_pay_period(
            &entries,
            PayPeriod::containing(date),
            filter,
            &users,
        ))
    }

    pub fn all_pay_periods(&self, caller_id: &str, filter: StatusFilter) -> Result<Vec<PayPeriodGroup>> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ListAll)?;
        let entries = self.all_entries()?;
        let users = self.users()?;
        Ok(grouping::group_pay_periods(&entries, filter, &users))
    }

    pub fn pending_pay_periods(&self, caller_id: &str) -> Result<Vec<PayPeriodGroup>> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ListAll)?;
        let entries = self.all_entries()?;
        let users = self.users()?;
        Ok(grouping::pending_pay_periods(&entries, &users))
    }

    pub fn overview(&self, caller_id: &str) -> Result<Overview> {
        let caller = self.caller(caller_id)?;
        authorize(&caller, Action::ListAll)?;
        let entries = self.all_entries()?;
        let users = self.users()?;
        Ok(rollups::build_overview(&entries, &users))
    }
}

fn store_op<T>(operation: &str, result: Result<T, StoreError>) -> Result<T> {
    result.map_err(|err| {
        error!(operation, error = %err, "store failure");
        TimesheetError::Persistence(err)
    })
}
