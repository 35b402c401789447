use crate::dates::parse_date;
use crate::error::{Result, TimesheetError};
use crate::models::{EntryForm, EntryPatch, EntryStatus, NewEntry, TimeEntry};

pub const MIN_HOURS: f64 = 0.0;
pub const MAX_HOURS: f64 = 24.0;

pub fn can_submit(status: EntryStatus) -> bool {
    matches!(status, EntryStatus::Draft | EntryStatus::Rejected)
}

pub fn check_submit(entry: &TimeEntry) -> Result<()> {
    if can_submit(entry.status) {
        return Ok(());
    }
    Err(TimesheetError::invalid_state(format!(
        "Entry is already {}. Cannot submit.",
        entry.status
    )))
}

pub fn check_edit(entry: &TimeEntry, by_admin: bool) -> Result<()> {
    if entry.status == EntryStatus::Approved && !by_admin {
        return Err(TimesheetError::forbidden(
            "Cannot edit approved entries. Please contact an admin.",
        ));
    }
    Ok(())
}

pub fn status_after_edit(current: EntryStatus, by_admin: bool) -> Option<EntryStatus> {
    if by_admin {
        return None;
    }
    match current {
        EntryStatus::Submitted | EntryStatus::Rejected => Some(EntryStatus::Draft),
        EntryStatus::Draft | EntryStatus::Approved => None,
    }
}

pub fn parse_hours(value: &str) -> Result<f64> {
    let hours: f64 = value
        .trim()
        .parse()
        .map_err(|_| TimesheetError::validation("Hours must be a valid number"))?;
    validate_hours(hours)
}

pub fn validate_hours(hours: f64) -> Result<f64> {
    if !hours.is_finite() {
        return Err(TimesheetError::validation("Hours must be a valid number"));
    }
    if !(MIN_HOURS..=MAX_HOURS).contains(&hours) {
        return Err(TimesheetError::validation("Hours must be between 0 and 24"));
    }
    Ok(hours)
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn new_entry(user_id: &str, form: &EntryForm) -> Result<NewEntry> {
    let (Some(date), Some(hours), Some(project)) = (
        present(&form.date),
        present(&form.hours),
        present(&form.project),
    ) else {
        return Err(TimesheetError::validation(
            "Date, hours, and project are required",
        ));
    };

    Ok(NewEntry {
        user_id: user_id.to_string(),
        date: parse_date(date).map_err(TimesheetError::Validation)?,
        hours: parse_hours(hours)?,
        project: project.to_string(),
        description: form.description.clone().unwrap_or_default(),
    })
}

pub fn edit_patch(form: &EntryForm) -> Result<EntryPatch> {
    let mut patch = EntryPatch::default();

    if let Some(date) = present(&form.date) {
        patch.date = Some(parse_date(date).map_err(TimesheetError::Validation)?);
    }
    if let Some(hours) = present(&form.hours) {
        patch.hours = Some(parse_hours(hours)?);
    }
    if let Some(project) = present(&form.project) {
        patch.project = Some(project.to_string());
    }
    if let Some(description) = &form.description {
        patch.description = Some(description.clone());
    }

    if patch.is_empty() {
        return Err(TimesheetError::validation("No valid fields to update"));
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{NaiveDate, Utc};

    fn entry(status: EntryStatus) -> TimeEntry {
        TimeEntry {
            id: "e1".to_string(),
            user_id: "u1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
            hours: 8.0,
            project: "Acme".to_string(),
            description: String::new(),
            status,
            created_at: Utc::now(),
        }
    }

    fn form(date: &str, hours: &str, project: &str) -> EntryForm {
        EntryForm {
            date: Some(date.to_string()),
            hours: Some(hours.to_string()),
            project: Some(project.to_string()),
            description: None,
        }
    }

    #[test]
    fn submit_allowed_only_from_draft_or_rejected() {
        for status in EntryStatus::ALL {
            let result = check_submit(&entry(status));
            if matches!(status, EntryStatus::Draft | EntryStatus::Rejected) {
                assert!(result.is_ok());
            } else {
                let err = result.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidState);
                assert!(err.to_string().contains(status.as_str()));
            }
        }
    }

    #[test]
    fn owner_cannot_edit_approved() {
        let err = check_edit(&entry(EntryStatus::Approved), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        for status in EntryStatus::ALL {
            assert!(check_edit(&entry(status), true).is_ok());
        }
    }

    #[test]
    fn owner_edit_resets_submitted_and_rejected() {
        assert_eq!(
            status_after_edit(EntryStatus::Submitted, false),
            Some(EntryStatus::Draft)
        );
        assert_eq!(
            status_after_edit(EntryStatus::Rejected, false),
            Some(EntryStatus::Draft)
        );
        assert_eq!(status_after_edit(EntryStatus::Draft, false), None);
        for status in EntryStatus::ALL {
            assert_eq!(status_after_edit(status, true), None);
        }
    }

    #[test]
    fn hours_bounds() {
        assert_eq!(parse_hours("0").unwrap(), 0.0);
        assert_eq!(parse_hours("24").unwrap(), 24.0);
        assert_eq!(parse_hours(" 7.5 ").unwrap(), 7.5);
        assert!(parse_hours("-0.25").is_err());
        assert!(parse_hours("24.25").is_err());
        assert!(parse_hours("eight").is_err());
        assert!(parse_hours("NaN").is_err());
        assert!(parse_hours("inf").is_err());
    }

    #[test]
    fn new_entry_requires_fields() {
        let err = new_entry("u1", &form("2025-11-18", "8", "")).unwrap_err();
        assert_eq!(err.to_string(), "Date, hours, and project are required");

        let err = new_entry("u1", &form("18/11/2025", "8", "Acme")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let entry = new_entry("u1", &form("2025-11-18", "0", "Acme")).unwrap();
        assert_eq!(entry.hours, 0.0);
        assert_eq!(entry.description, "");
    }

    #[test]
    fn edit_patch_treats_blank_as_absent() {
        let patch = edit_patch(&EntryForm {
            date: Some(String::new()),
            hours: Some("0".to_string()),
            project: Some("  ".to_string()),
            description: None,
        })
        .unwrap();
        assert_eq!(patch.hours, Some(0.0));
        assert!(patch.date.is_none());
        assert!(patch.project.is_none());

        let patch = edit_patch(&EntryForm {
            description: Some(String::new()),
            ..EntryForm::default()
        })
        .unwrap();
        assert_eq!(patch.description.as_deref(), Some(""));

        let err = edit_patch(&EntryForm::default()).unwrap_err();
        assert_eq!(err.to_string(), "No valid fields to update");
    }
}
