pub mod bulk;
pub mod config;
pub mod dates;
pub mod error;
pub mod grouping;
pub mod lifecycle;
pub mod models;
pub mod policy;
pub mod rollups;
pub mod service;
pub mod store;

pub use error::{ErrorKind, Result, StoreError, TimesheetError};
pub use service::Timesheet;
