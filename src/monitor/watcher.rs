use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{probe::ActivityProbe, store::entities::IdleReason, utils::clock::Clock};

use super::idle::IdleEvaluator;

/// A presence change detected by the watcher. Emitted only on transitions,
/// never on every poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityTransition {
    Idle(IdleReason),
    Active,
}

/// One round of probe readings.
struct Observation {
    idle_ms: u32,
    locked: bool,
    pointer_moved: bool,
}

pub struct ActivityWatcher {
    next: mpsc::Sender<ActivityTransition>,
    probe: Box<dyn ActivityProbe>,
    shutdown: CancellationToken,
    evaluator: IdleEvaluator,
    poll_interval: Duration,
    clock: Box<dyn Clock>,
    is_idle: bool,
    last_pointer: Option<(i32, i32)>,
}

impl ActivityWatcher {
    pub fn new(
        next: mpsc::Sender<ActivityTransition>,
        probe: Box<dyn ActivityProbe>,
        shutdown: CancellationToken,
        evaluator: IdleEvaluator,
        poll_interval: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            probe,
            shutdown,
            evaluator,
            poll_interval,
            clock,
            is_idle: false,
            last_pointer: None,
        }
    }

    /// Queries the probe once. Failures are downgraded to "no signal" so a
    /// flaky backend never interrupts the user.
    fn observe(&mut self) -> Observation {
        let idle_ms = self
            .probe
            .idle_time()
            .inspect_err(|e| error!("Failed to read idle time {e:?}"))
            .unwrap_or(0);
        let locked = self
            .probe
            .is_locked()
            .inspect_err(|e| error!("Failed to read lock state {e:?}"))
            .unwrap_or(false);
        let pointer_moved = match self.probe.pointer_position() {
            Ok(position) => {
                let moved = self.last_pointer.is_some_and(|last| last != position);
                self.last_pointer = Some(position);
                moved
            }
            Err(e) => {
                debug!("Failed to read pointer position {e:?}");
                false
            }
        };
        Observation {
            idle_ms,
            locked,
            pointer_moved,
        }
    }

    /// The internal idle flag guarantees one transition per state change.
    /// Going idle needs over-threshold idle time or a locked workstation;
    /// coming back additionally needs pointer movement since the last poll.
    fn evaluate(&mut self, observation: Observation) -> Option<ActivityTransition> {
        let over_threshold = self.evaluator.is_idle(observation.idle_ms);
        if (over_threshold || observation.locked) && !self.is_idle {
            self.is_idle = true;
            let reason = if observation.locked {
                IdleReason::Locked
            } else {
                IdleReason::Idle
            };
            return Some(ActivityTransition::Idle(reason));
        }
        if self.is_idle && !over_threshold && !observation.locked && observation.pointer_moved {
            self.is_idle = false;
            return Some(ActivityTransition::Active);
        }
        None
    }

    /// Executes the watcher event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.clock.instant();
        loop {
            poll_point += self.poll_interval;

            let observation = self.observe();
            if let Some(transition) = self.evaluate(observation) {
                info!("Detected transition {:?}", transition);
                self.next
                    .send(transition)
                    .await
                    .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
            }

            tokio::select! {
                // Cancelation stops the event loop, drops the sender, and
                // consequently stops the dispatch module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(poll_point) => ()
            }
        }
    }
}
