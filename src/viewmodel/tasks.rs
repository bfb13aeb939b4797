use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};

struct Slot {
    generation: u64,
    token: CancellationToken,
}

/// Background loads of a view model, keyed by kind.
///
/// Starting a load of some kind cancels the previous load of that kind and
/// bumps its generation. A [`Ticket`] remembers the generation it was issued
/// for, so a superseded load can no longer publish.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    slots: Arc<DashMap<&'static str, Slot>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::with_capacity(4)),
        }
    }

    /// Supersedes any load of `kind` and returns the ticket for the next one.
    pub fn ticket(&self, kind: &'static str) -> Ticket {
        let token = CancellationToken::new();
        let mut slot = self.slots.entry(kind).or_insert_with(|| Slot {
            generation: 0,
            token: CancellationToken::new(),
        });
        slot.token.cancel();
        slot.generation += 1;
        slot.token = token.clone();

        Ticket {
            kind,
            generation: slot.generation,
            token,
            slots: Arc::clone(&self.slots),
        }
    }

    /// Runs the future built by `task` on the runtime until it finishes or
    /// `ticket` is cancelled. The future receives the ticket to publish with.
    pub fn spawn<T, F, Fut>(&self, ticket: Ticket, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(Ticket) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let token = ticket.token.clone();
        let kind = ticket.kind;
        let task = task(ticket);
        let handle = tokio::spawn({
            let token = token.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("Background {} load cancelled", kind);
                        None
                    }
                    result = task => Some(result),
                }
            }
        });

        TaskHandle { handle, token }
    }

    pub fn cancel(&self, kind: &'static str) {
        if let Some(slot) = self.slots.get(kind) {
            slot.token.cancel();
        }
    }

    pub fn cancel_all(&self) {
        for slot in self.slots.iter() {
            slot.token.cancel();
        }
    }
}

/// Identifies one load among the loads of its kind.
#[derive(Clone)]
pub struct Ticket {
    kind: &'static str,
    generation: u64,
    token: CancellationToken,
    slots: Arc<DashMap<&'static str, Slot>>,
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        !self.token.is_cancelled()
            && self
                .slots
                .get(self.kind)
                .is_some_and(|slot| slot.generation == self.generation)
    }
}

/// Handle to a spawned load. Dropping it detaches the task.
pub struct TaskHandle<T> {
    handle: JoinHandle<Option<Result<T>>>,
    token: CancellationToken,
}

impl<T> TaskHandle<T> {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task. `Ok(None)` means it was cancelled first.
    pub async fn wait(self) -> Result<Option<T>> {
        match self.handle.await {
            Ok(Some(result)) => result.map(Some),
            Ok(None) => Ok(None),
            Err(e) if e.is_cancelled() => Ok(None),
            Err(e) => Err(AppError::Background(e.to_string())),
        }
    }
}
