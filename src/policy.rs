use crate::error::{Result, TimesheetError};
use crate::models::{Role, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns(&self, owner_id: &str) -> bool {
        self.id == owner_id
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    CreateEntry,
    ReadEntry { owner: &'a str },
    EditEntry { owner: &'a str },
    DeleteEntry { owner: &'a str },
    SubmitEntry { owner: &'a str },
    ReviewEntry,
    BulkApprove,
    ListAll,
    ManageUsers,
    DeleteUser { target: &'a str },
    ListProjects,
    ManageProjects,
}

pub fn allows(caller: &Caller, action: Action<'_>) -> bool {
    match action {
        Action::CreateEntry | Action::ListProjects => true,
        Action::ReadEntry { owner } | Action::EditEntry { owner } | Action::DeleteEntry { owner } => {
            caller.owns(owner) || caller.is_admin()
        }
        Action::SubmitEntry { owner } => caller.owns(owner),
        Action::ReviewEntry
        | Action::BulkApprove
        | Action::ListAll
        | Action::ManageUsers
        | Action::ManageProjects => caller.is_admin(),
        Action::DeleteUser { target } => caller.is_admin() && !caller.owns(target),
    }
}

pub fn authorize(caller: &Caller, action: Action<'_>) -> Result<()> {
    if allows(caller, action) {
        return Ok(());
    }
    let message = match action {
        Action::ReviewEntry
        | Action::BulkApprove
        | Action::ListAll
        | Action::ManageUsers
        | Action::ManageProjects => "Forbidden - Admin access required",
        Action::DeleteUser { .. } if caller.is_admin() => "Cannot delete your own account",
        Action::DeleteUser { .. } => "Forbidden - Admin access required",
        _ => "Forbidden",
    };
    Err(TimesheetError::forbidden(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn caller(id: &str, role: Role) -> Caller {
        Caller {
            id: id.to_string(),
            role,
        }
    }

    #[test]
    fn owners_manage_their_own_entries() {
        let owner = caller("u1", Role::Employee);
        assert!(allows(&owner, Action::EditEntry { owner: "u1" }));
        assert!(allows(&owner, Action::DeleteEntry { owner: "u1" }));
        assert!(allows(&owner, Action::SubmitEntry { owner: "u1" }));
        assert!(!allows(&owner, Action::EditEntry { owner: "u2" }));
        assert!(!allows(&owner, Action::DeleteEntry { owner: "u2" }));
        assert!(!allows(&owner, Action::ReadEntry { owner: "u2" }));
    }

    #[test]
    fn contractors_are_not_admins() {
        let contractor = caller("c1", Role::Contractor);
        assert!(allows(&contractor, Action::CreateEntry));
        assert!(!allows(&contractor, Action::ReviewEntry));
        assert!(!allows(&contractor, Action::BulkApprove));
        assert!(!allows(&contractor, Action::ListAll));
    }

    #[test]
    fn admins_reach_every_entry_but_not_others_submissions() {
        let admin = caller("a1", Role::Admin);
        assert!(allows(&admin, Action::EditEntry { owner: "u1" }));
        assert!(allows(&admin, Action::DeleteEntry { owner: "u1" }));
        assert!(allows(&admin, Action::ReviewEntry));
        assert!(allows(&admin, Action::BulkApprove));
        assert!(!allows(&admin, Action::SubmitEntry { owner: "u1" }));
        assert!(allows(&admin, Action::SubmitEntry { owner: "a1" }));
    }

    #[test]
    fn admin_cannot_delete_self() {
        let admin = caller("a1", Role::Admin);
        assert!(allows(&admin, Action::DeleteUser { target: "u1" }));
        let err = authorize(&admin, Action::DeleteUser { target: "a1" }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.to_string(), "Cannot delete your own account");
    }

    #[test]
    fn admin_only_actions_explain_themselves() {
        let employee = caller("u1", Role::Employee);
        let err = authorize(&employee, Action::ManageUsers).unwrap_err();
        assert_eq!(err.to_string(), "Forbidden - Admin access required");
        let err = authorize(&employee, Action::EditEntry { owner: "u2" }).unwrap_err();
        assert_eq!(err.to_string(), "Forbidden");
    }
}
