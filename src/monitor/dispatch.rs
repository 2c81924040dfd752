use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc::Receiver, Mutex};
use tracing::{debug, error, info};

use crate::store::work_log::WorkLogStore;

use super::watcher::ActivityTransition;

/// Represents a consumer of presence transitions. Abstracting it keeps the
/// dispatch loop testable without a real work log behind it.
pub trait TransitionHandler {
    fn apply(
        &mut self,
        transition: ActivityTransition,
    ) -> impl std::future::Future<Output = Result<()>>;
}

/// Receives transitions from the watcher and applies them one by one.
pub struct DispatchModule<Handler> {
    receiver: Receiver<ActivityTransition>,
    handler: Handler,
}

impl<H: TransitionHandler> DispatchModule<H> {
    pub fn new(receiver: Receiver<ActivityTransition>, handler: H) -> Self {
        Self { receiver, handler }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(transition) = self.receiver.recv().await {
            debug!("Applying transition {:?}", transition);
            match self.handler.apply(transition).await {
                Ok(_) => {
                    info!("Applied transition {:?}", transition)
                }
                Err(e) => {
                    error!("Error applying transition {:?}: {e:?}", transition)
                }
            }
        }

        self.receiver.close();
        Ok(())
    }
}

/// Bridges transitions into [WorkLogStore] mutations. The store is shared
/// with the summary ticker, so every mutation happens under the mutex.
pub struct StoreHandler {
    store: Arc<Mutex<WorkLogStore>>,
}

impl StoreHandler {
    pub fn new(store: Arc<Mutex<WorkLogStore>>) -> Self {
        Self { store }
    }
}

impl TransitionHandler for StoreHandler {
    async fn apply(&mut self, transition: ActivityTransition) -> Result<()> {
        let mut store = self.store.lock().await;
        match transition {
            ActivityTransition::Idle(reason) => store.handle_idle(reason).await,
            ActivityTransition::Active => store.handle_active().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use anyhow::Result;
    use tokio::sync::mpsc;

    use crate::store::entities::IdleReason;

    use super::*;

    struct RecordingHandler {
        seen: Arc<StdMutex<Vec<ActivityTransition>>>,
    }

    impl TransitionHandler for RecordingHandler {
        async fn apply(&mut self, transition: ActivityTransition) -> Result<()> {
            self.seen.lock().unwrap().push(transition);
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_drains_the_channel_in_order() -> Result<()> {
        let (sender, receiver) = mpsc::channel(4);
        sender
            .send(ActivityTransition::Idle(IdleReason::Locked))
            .await?;
        sender.send(ActivityTransition::Active).await?;
        drop(sender);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let module = DispatchModule::new(receiver, RecordingHandler { seen: seen.clone() });
        module.run().await?;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ActivityTransition::Idle(IdleReason::Locked),
                ActivityTransition::Active
            ]
        );
        Ok(())
    }
}
