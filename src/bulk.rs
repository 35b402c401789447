use serde::Serialize;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::models::{EntryPatch, EntryStatus, TimeEntry};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkError {
    pub entry_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkApproval {
    pub message: String,
    pub approved_count: usize,
    pub total_requested: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BulkError>,
    #[serde(skip)]
    pub entries: Vec<TimeEntry>,
}

fn approve_one<S: Store + ?Sized>(store: &S, entry_id: &str) -> Result<TimeEntry, String> {
    let entry = store
        .find_entry_by_id(entry_id)
        .map_err(|err| store_failure(entry_id, err))?
        .ok_or_else(|| "Entry not found".to_string())?;

    if entry.status != EntryStatus::Submitted {
        return Err(format!("Entry is {}, not submitted", entry.status));
    }

    store
        .update_entry(entry_id, &EntryPatch::status(EntryStatus::Approved))
        .map_err(|err| store_failure(entry_id, err))?
        .ok_or_else(|| "Failed to update entry".to_string())
}

fn store_failure(entry_id: &str, err: StoreError) -> String {
    warn!(entry_id, error = %err, "bulk approval store failure");
    "Failed to update entry".to_string()
}

pub fn approve_submitted<S: Store + ?Sized>(store: &S, entry_ids: &[String]) -> BulkApproval {
    let results: Vec<(String, Result<TimeEntry, String>)> = entry_ids
        .iter()
        .map(|entry_id| (entry_id.clone(), approve_one(store, entry_id)))
        .collect();

    let (entries, errors) = results.into_iter().fold(
        (Vec::new(), Vec::new()),
        |(mut entries, mut errors), (entry_id, result)| {
            match result {
                Ok(entry) => entries.push(entry),
                Err(error) => {
                    warn!(entry_id = %entry_id, %error, "entry skipped by bulk approval");
                    errors.push(BulkError { entry_id, error });
                }
            }
            (entries, errors)
        },
    );

    let approved_count = entries.len();
    let total_requested = entry_ids.len();
    info!(approved_count, total_requested, "bulk approval finished");

    BulkApproval {
        message: format!("Approved {approved_count} of {total_requested} entries"),
        approved_count,
        total_requested,
        errors,
        entries,
    }
}
