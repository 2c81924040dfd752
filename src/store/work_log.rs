use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf};

use anyhow::{bail, Context, Result};
use fs4::tokio::AsyncFileExt;
use serde_json::{Map, Value};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, info};

use crate::{
    summary,
    utils::{
        clock::Clock,
        time::{date_to_log_key, format_hhmm, hhmm_to_minutes, minutes_to_hhmm},
    },
};

use super::entities::{
    DayLog, DaySummary, IdleReason, InactivePeriod, Session, SessionKind, SessionSource,
};

/// Owns the `{date -> DayLog}` document and every mutation over it.
///
/// Each mutation is a load-mutate-persist transaction: the on-disk document
/// is reloaded first so concurrent cli invocations and the daemon see each
/// other's writes, and the result is written back immediately. Persistence
/// failures propagate to the caller since a lost write loses the event.
pub struct WorkLogStore {
    log_path: PathBuf,
    required_time: String,
    clock: Box<dyn Clock>,
    data: BTreeMap<String, DayLog>,
}

impl WorkLogStore {
    pub async fn open(
        log_path: PathBuf,
        required_minutes: u32,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        let mut store = Self {
            log_path,
            required_time: minutes_to_hhmm(required_minutes),
            clock,
            data: BTreeMap::new(),
        };
        store.reload().await?;
        store.today_mut();
        Ok(store)
    }

    fn today_key(&self) -> String {
        date_to_log_key(self.clock.time().date_naive())
    }

    fn now_hhmm(&self) -> String {
        format_hhmm(self.clock.time().time())
    }

    /// Creates today's entry when it is missing. Every mutation goes through
    /// this, so a store living across midnight starts a fresh entry instead
    /// of appending to yesterday.
    fn today_mut(&mut self) -> &mut DayLog {
        let key = self.today_key();
        let required_time = self.required_time.clone();
        self.data
            .entry(key)
            .or_insert_with(|| DayLog::new(required_time))
    }

    pub fn today(&self) -> Option<&DayLog> {
        self.data.get(&self.today_key())
    }

    pub fn summary(&self) -> Option<&DaySummary> {
        self.today().map(|day| &day.summary)
    }

    /// Re-reads the whole document. A missing file is an empty store.
    pub async fn reload(&mut self) -> Result<()> {
        match File::open(&self.log_path).await {
            Ok(mut file) => {
                file.lock_shared()?;
                let mut contents = String::new();
                let result = file.read_to_string(&mut contents).await;
                file.unlock_async().await?;
                result.with_context(|| format!("reading work log {:?}", self.log_path))?;
                self.data = if contents.trim().is_empty() {
                    BTreeMap::new()
                } else {
                    serde_json::from_str(&contents)
                        .with_context(|| format!("parsing work log {:?}", self.log_path))?
                };
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No work log at {:?} yet", self.log_path);
                self.data = BTreeMap::new();
            }
            Err(e) => {
                return Err(e).with_context(|| format!("opening work log {:?}", self.log_path))
            }
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let payload = serde_json::to_vec_pretty(&self.data)?;
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.log_path)
            .await
            .with_context(|| format!("opening work log {:?}", self.log_path))?;
        file.lock_exclusive()?;
        let result = async {
            file.write_all(&payload).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;
        result.with_context(|| format!("writing work log {:?}", self.log_path))?;
        Ok(())
    }

    /// Appends a session. A `start` session that matches an already recorded
    /// `{start_time, source}` pair is dropped silently, which guards against
    /// re-entrant start-of-day events. A supplied location overwrites the
    /// day's `work_location` (last write wins).
    pub async fn add_session(&mut self, session: Session, location: Option<String>) -> Result<()> {
        self.reload().await?;
        let day = self.today_mut();

        if session.kind == SessionKind::Start
            && day.sessions.iter().any(|existing| {
                existing.kind == SessionKind::Start
                    && existing.start_time == session.start_time
                    && existing.source == session.source
            })
        {
            debug!("Skipping duplicate start session at {}", session.start_time);
            return Ok(());
        }

        day.sessions.push(session);
        if let Some(location) = location {
            day.work_location = Some(location);
        }
        self.persist().await
    }

    /// Closes the most recent open session. A no-op when nothing is open.
    pub async fn end_last_session(
        &mut self,
        end_time: &str,
        kind: Option<SessionKind>,
    ) -> Result<()> {
        self.reload().await?;
        let day = self.today_mut();
        if let Some(open) = day.sessions.iter_mut().rev().find(|s| s.is_open()) {
            open.end_time = Some(end_time.to_string());
            if let Some(kind) = kind {
                open.kind = kind;
            }
        }
        self.persist().await
    }

    pub async fn add_inactive_period(
        &mut self,
        start: &str,
        end: Option<&str>,
        note: Option<&str>,
    ) -> Result<()> {
        self.reload().await?;
        let day = self.today_mut();
        day.inactive_periods.push(InactivePeriod {
            start_time: start.to_string(),
            end_time: end.map(ToString::to_string),
            note: note.map(ToString::to_string),
        });
        self.persist().await
    }

    /// The watcher detected the user going away: close the running session
    /// and open an inactive period tagged with the reason.
    pub async fn handle_idle(&mut self, reason: IdleReason) -> Result<()> {
        info!("User is {reason}");
        let now = self.now_hhmm();
        self.end_last_session(&now, None).await?;
        self.add_inactive_period(&now, None, Some(reason.as_str()))
            .await
    }

    /// The watcher detected the user coming back: close the open inactive
    /// period and start a fresh activity session.
    pub async fn handle_active(&mut self) -> Result<()> {
        info!("User is back to activity");
        let now = self.now_hhmm();
        self.reload().await?;
        let day = self.today_mut();
        if let Some(open) = day.inactive_periods.iter_mut().rev().find(|p| p.is_open()) {
            open.end_time = Some(now.clone());
        }
        self.persist().await?;
        self.add_session(
            Session {
                start_time: now,
                end_time: None,
                source: SessionSource::Auto,
                kind: SessionKind::Activity,
                note: Some("back from break".to_string()),
            },
            None,
        )
        .await
    }

    pub fn has_session(&self, kind: SessionKind) -> bool {
        self.today()
            .is_some_and(|day| day.sessions.iter().any(|s| s.kind == kind))
    }

    /// Whether the daily target is met, and how many minutes remain if not.
    pub fn check_target_met(&self) -> (bool, u32) {
        let Some(day) = self.today() else {
            return (false, hhmm_to_minutes(&self.required_time).unwrap_or(0));
        };
        let required = hhmm_to_minutes(&day.required_time).unwrap_or(0);
        let reported = hhmm_to_minutes(&day.summary.total_reported).unwrap_or(0);
        (reported >= required, required.saturating_sub(reported))
    }

    /// Generic accessor over the JSON shape of today's entry. `start_time`
    /// is special-cased to the first `start` session of the day.
    pub fn get_today_value(&self, key: &str) -> Option<Value> {
        let day = self.today()?;
        if key == "start_time" {
            return day
                .sessions
                .iter()
                .find(|s| s.kind == SessionKind::Start)
                .map(|s| Value::String(s.start_time.clone()));
        }
        serde_json::to_value(day).ok()?.get(key).cloned()
    }

    /// [get_today_value](Self::get_today_value) with the `HH:MM` result
    /// converted to whole minutes.
    pub fn get_today_minutes(&self, key: &str) -> Option<u32> {
        match self.get_today_value(key)? {
            Value::String(value) if value.contains(':') => hhmm_to_minutes(&value),
            _ => None,
        }
    }

    /// Sets a nested field of today's entry by dotted path, creating
    /// intermediate objects as needed. Used for manual corrections such as
    /// `summary.manual_adjustments`. A path that falls outside the day's
    /// shape is rejected: the deserialize round trip would drop it, and a
    /// correction the caller believes was recorded must not vanish.
    pub async fn update_field(&mut self, path: &str, value: Value) -> Result<()> {
        self.reload().await?;
        let day = self.today_mut();
        let mut tree = serde_json::to_value(&*day)?;

        let mut segments: Vec<&str> = path.split('.').collect();
        let last = segments.pop().filter(|s| !s.is_empty()).context("empty field path")?;
        let mut node = &mut tree;
        for segment in segments {
            node = node
                .as_object_mut()
                .with_context(|| format!("{segment} in {path} is not an object"))?
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
        }
        node.as_object_mut()
            .with_context(|| format!("{path} does not point into an object"))?
            .insert(last.to_string(), value);

        let updated: DayLog = serde_json::from_value(tree)
            .with_context(|| format!("update of {path} broke the day entry"))?;
        let echo = serde_json::to_value(&updated)?;
        let survived = path
            .split('.')
            .try_fold(&echo, |node, segment| node.get(segment))
            .is_some();
        if !survived {
            bail!("{path} is not a field of the day entry");
        }

        *day = updated;
        self.persist().await
    }

    /// Runs the summary engine against the current snapshot and writes the
    /// result back.
    pub async fn recompute_summary(&mut self) -> Result<()> {
        self.reload().await?;
        let now = self.clock.time().time();
        let day = self.today_mut();
        let fresh = summary::compute(day, now);
        day.summary = fresh;
        info!("You have {} left to work", day.summary.missing_time);
        self.persist().await
    }
}
