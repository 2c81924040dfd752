//! Tracks your work day in the background: when you started, when you were
//! away, and whether you hit the daily hour target. A small polling daemon
//! watches for idle and lock transitions while the cli exposes the
//! start/break/finish flow and the daily summary.
//!

pub mod cli;
pub mod config;
pub mod location;
pub mod monitor;
pub mod probe;
pub mod store;
pub mod summary;
pub mod utils;
