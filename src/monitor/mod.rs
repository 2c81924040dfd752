use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use dispatch::{DispatchModule, StoreHandler};
use idle::IdleEvaluator;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::error;
use watcher::{ActivityTransition, ActivityWatcher};

use crate::{
    config::WorkdayConfig,
    probe::{ActivityProbe, GenericActivityProbe},
    store::{work_log::WorkLogStore, WORK_LOG_FILE},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod dispatch;
pub mod idle;
pub mod shutdown;
pub mod watcher;

/// Represents the starting point for the background monitor: a watcher polls
/// the OS for idle, lock, and pointer signals, a dispatcher turns the
/// resulting transitions into work log mutations, and a ticker keeps the day
/// summary fresh.
pub async fn start_monitor(dir: PathBuf, config: WorkdayConfig) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<ActivityTransition>(10);
    let probe = GenericActivityProbe::new()?;

    let shutdown_token = CancellationToken::new();

    let store = WorkLogStore::open(
        dir.join(WORK_LOG_FILE),
        config.required_minutes(),
        Box::new(DefaultClock),
    )
    .await?;
    let store = Arc::new(Mutex::new(store));

    let watcher = create_watcher(sender, probe, &shutdown_token, DefaultClock, &config);
    let dispatcher = DispatchModule::new(receiver, StoreHandler::new(store.clone()));

    let (_, watch_result, dispatch_result, _) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        watcher.run(),
        dispatcher.run(),
        summary_ticker(
            store,
            Duration::from_secs(config.summary_interval_seconds),
            shutdown_token.clone(),
        ),
    );

    if let Err(watch_result) = watch_result {
        error!("Watcher module got an error {:?}", watch_result);
    }

    if let Err(dispatch_result) = dispatch_result {
        error!("Dispatch module got an error {:?}", dispatch_result);
    }

    Ok(())
}

fn create_watcher(
    sender: mpsc::Sender<ActivityTransition>,
    probe: impl ActivityProbe + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
    config: &WorkdayConfig,
) -> ActivityWatcher {
    ActivityWatcher::new(
        sender,
        Box::new(probe),
        shutdown_token.clone(),
        IdleEvaluator::from_seconds(config.idle_threshold_seconds),
        Duration::from_secs(config.poll_interval_seconds),
        Box::new(clock),
    )
}

/// Recomputes the summary on a fixed interval until shutdown. Runs on the
/// same shared store as the dispatcher, behind the same mutex.
async fn summary_ticker(
    store: Arc<Mutex<WorkLogStore>>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(interval) => ()
        }
        let mut store = store.lock().await;
        if let Err(e) = store.recompute_summary().await {
            error!("Failed to recompute summary {:?}", e);
        }
    }
}

#[cfg(test)]
mod monitor_tests {
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use anyhow::Result;
    use tempfile::tempdir;
    use tokio::sync::{mpsc, Mutex};
    use tokio_util::sync::CancellationToken;

    use crate::{
        probe::MockActivityProbe,
        store::{
            entities::SessionKind,
            work_log::WorkLogStore,
            WORK_LOG_FILE,
        },
        utils::{clock::DefaultClock, logging::TEST_LOGGING},
    };

    use super::{
        dispatch::{DispatchModule, StoreHandler},
        idle::IdleEvaluator,
        watcher::{ActivityTransition, ActivityWatcher},
    };
    use std::sync::Arc;

    /// Smoke test for the whole pipeline: the probe reports one long idle
    /// reading followed by activity with pointer movement, and the work log
    /// ends up with a closed inactive period plus an open activity session.
    #[tokio::test]
    async fn smoke_test_monitor() -> Result<()> {
        *TEST_LOGGING;

        let mut probe = MockActivityProbe::new();
        let idle_calls = AtomicU32::new(0);
        probe.expect_idle_time().returning(move || {
            // Second poll only: way past any threshold.
            match idle_calls.fetch_add(1, Ordering::SeqCst) {
                1 => Ok(10_000_000),
                _ => Ok(0),
            }
        });
        probe.expect_is_locked().returning(|| Ok(false));
        let pointer_calls = AtomicU32::new(0);
        probe.expect_pointer_position().returning(move || {
            let n = pointer_calls.fetch_add(1, Ordering::SeqCst) as i32;
            Ok((n, n))
        });

        let dir = tempdir()?;
        let store = WorkLogStore::open(
            dir.path().join(WORK_LOG_FILE),
            528,
            Box::new(DefaultClock),
        )
        .await?;
        let store = Arc::new(Mutex::new(store));

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<ActivityTransition>(10);
        let watcher = ActivityWatcher::new(
            sender,
            Box::new(probe),
            shutdown_token.clone(),
            IdleEvaluator::from_seconds(300),
            Duration::from_millis(20),
            Box::new(DefaultClock),
        );
        let dispatcher = DispatchModule::new(receiver, StoreHandler::new(store.clone()));

        let (_, watch_result, dispatch_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                shutdown_token.cancel()
            },
            watcher.run(),
            dispatcher.run(),
        );

        watch_result?;
        dispatch_result?;

        let store = store.lock().await;
        let day = store.today().expect("today's entry exists");
        assert_eq!(day.inactive_periods.len(), 1);
        assert!(!day.inactive_periods[0].is_open());
        assert_eq!(day.inactive_periods[0].note.as_deref(), Some("idle"));
        assert_eq!(day.sessions.len(), 1);
        assert_eq!(day.sessions[0].kind, SessionKind::Activity);
        assert!(day.sessions[0].is_open());
        assert!(store.has_session(SessionKind::Activity));
        Ok(())
    }
}
