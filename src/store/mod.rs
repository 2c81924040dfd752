//!  The persisted work log is organized through [work_log::WorkLogStore].
//!  The basic idea is:
//!   - One JSON document holds every day, keyed as `YYYY-MM-DD`.
//!   - Each day owns its sessions, inactive periods, and derived summary.
//!   - Every mutation reloads the document, applies the change, and writes
//!     the whole document back under an advisory lock.

pub mod entities;
pub mod work_log;

/// File name of the work log inside the application directory.
pub const WORK_LOG_FILE: &str = "work_log.json";
