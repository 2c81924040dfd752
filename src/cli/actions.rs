//! Handlers behind the user-facing commands: the start/break/finish flow and
//! the summary views the original tray application bound to buttons.

use std::path::Path;

use ansi_term::Colour::{Green, Red};
use anyhow::{bail, Result};
use chrono::Local;
use tracing::info;

use crate::{
    config::WorkdayConfig,
    location::LocationDetector,
    store::{
        entities::{DaySummary, Session, SessionKind, SessionSource},
        work_log::WorkLogStore,
        WORK_LOG_FILE,
    },
    utils::{
        clock::DefaultClock,
        time::{format_hhmm, minutes_to_hhmm, parse_hhmm},
    },
};

async fn open_store(app_dir: &Path, config: &WorkdayConfig) -> Result<WorkLogStore> {
    WorkLogStore::open(
        app_dir.join(WORK_LOG_FILE),
        config.required_minutes(),
        Box::new(DefaultClock),
    )
    .await
}

fn now_hhmm() -> String {
    format_hhmm(Local::now().time())
}

pub async fn start_work(
    app_dir: &Path,
    config: &WorkdayConfig,
    location: Option<String>,
    at: Option<String>,
) -> Result<()> {
    let mut store = open_store(app_dir, config).await?;

    if store.has_session(SessionKind::Start) {
        let started = store
            .get_today_value("start_time")
            .and_then(|v| v.as_str().map(ToString::to_string))
            .unwrap_or_default();
        println!("Work day already started at {started}.");
        return Ok(());
    }

    let location =
        location.unwrap_or_else(|| LocationDetector::new(config).detect().to_string());

    // A user-supplied time is a correction; a detected one is automatic.
    let (start_time, source) = match at {
        Some(value) => {
            if parse_hhmm(&value).is_none() {
                bail!("Invalid start time {value:?}, expected HH:MM");
            }
            (value, SessionSource::Manual)
        }
        None => (now_hhmm(), SessionSource::Auto),
    };

    store
        .add_session(
            Session {
                start_time: start_time.clone(),
                end_time: None,
                source,
                kind: SessionKind::Start,
                note: None,
            },
            Some(location.clone()),
        )
        .await?;
    store.recompute_summary().await?;

    info!("Work session started at {start_time} from {location}");
    println!("Work day started at {start_time} from {location}.");
    Ok(())
}

pub async fn finish_work(app_dir: &Path, config: &WorkdayConfig) -> Result<()> {
    let mut store = open_store(app_dir, config).await?;
    store.recompute_summary().await?;

    let (met, remaining) = store.check_target_met();

    store
        .end_last_session(&now_hhmm(), Some(SessionKind::Finish))
        .await?;
    store.recompute_summary().await?;

    if met {
        println!("{}", Green.paint("Target met, enjoy your evening."));
    } else {
        println!(
            "{}",
            Red.paint(format!(
                "Target not met, {} short.",
                minutes_to_hhmm(remaining)
            ))
        );
    }
    if let Some(summary) = store.summary() {
        print_summary(summary);
    }
    info!("Workday finished and summary recorded");
    Ok(())
}

pub async fn take_break(
    app_dir: &Path,
    config: &WorkdayConfig,
    note: Option<String>,
) -> Result<()> {
    let mut store = open_store(app_dir, config).await?;
    let now = now_hhmm();
    let note = note.unwrap_or_else(|| "break".to_string());

    store
        .end_last_session(&now, Some(SessionKind::Break))
        .await?;
    store.add_inactive_period(&now, None, Some(&note)).await?;

    info!("Break started at {now} with note: {note}");
    println!("Break started at {now} ({note}).");
    Ok(())
}

pub async fn show_status(app_dir: &Path, config: &WorkdayConfig) -> Result<()> {
    let mut store = open_store(app_dir, config).await?;
    store.recompute_summary().await?;
    if let Some(summary) = store.summary() {
        print_summary(summary);
    }
    Ok(())
}

pub async fn adjust(app_dir: &Path, config: &WorkdayConfig, value: &str) -> Result<()> {
    if parse_hhmm(value).is_none() {
        bail!("Invalid adjustment {value:?}, expected HH:MM");
    }
    let mut store = open_store(app_dir, config).await?;
    store
        .update_field(
            "summary.manual_adjustments",
            serde_json::Value::String(value.to_string()),
        )
        .await?;
    store.recompute_summary().await?;
    println!("Manual adjustment set to {value}.");
    if let Some(summary) = store.summary() {
        print_summary(summary);
    }
    Ok(())
}

fn print_summary(summary: &DaySummary) {
    println!("Tracked\t\t{}", summary.total_tracked);
    println!("Inactive\t{}", summary.total_inactive);
    println!("Adjustments\t{}", summary.manual_adjustments);
    println!("Reported\t{}", summary.total_reported);
    if summary.met_target {
        println!("Overtime\t{}", Green.paint(&summary.overtime));
    } else {
        println!("Missing\t\t{}", Red.paint(&summary.missing_time));
    }
}
