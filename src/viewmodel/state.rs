use std::sync::Arc;

use tokio::sync::watch;

use super::tasks::Ticket;

/// Observable holder for one screen's snapshot.
///
/// Every update replaces the snapshot as a whole. Subscribers get a read-only
/// `watch::Receiver`; only the owning view model holds the holder itself.
pub struct StateHolder<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for StateHolder<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> StateHolder<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn snapshot(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Replaces the snapshot with `f(current)`.
    pub(crate) fn update(&self, f: impl FnOnce(&T) -> T) {
        self.sender.send_modify(|state| *state = f(state));
    }

    /// Like [`update`](Self::update), but only while `ticket` belongs to the
    /// latest load of its kind. Returns whether the snapshot was replaced.
    pub(crate) fn update_if_current(&self, ticket: &Ticket, f: impl FnOnce(&T) -> T) -> bool {
        self.sender.send_if_modified(|state| {
            if !ticket.is_current() {
                return false;
            }
            *state = f(state);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewmodel::tasks::BackgroundTasks;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        value: i32,
        label: String,
    }

    #[tokio::test]
    async fn test_subscribers_see_whole_snapshots() {
        let holder = StateHolder::new(Counter::default());
        let mut receiver = holder.subscribe();

        holder.update(|s| Counter {
            value: s.value + 1,
            label: "one".into(),
        });

        receiver.changed().await.unwrap();
        assert_eq!(
            *receiver.borrow_and_update(),
            Counter {
                value: 1,
                label: "one".into()
            }
        );
        assert_eq!(holder.snapshot().value, 1);
    }

    #[tokio::test]
    async fn test_superseded_ticket_cannot_publish() {
        let holder = StateHolder::new(Counter::default());
        let tasks = BackgroundTasks::new();

        let old = tasks.ticket("load");
        let new = tasks.ticket("load");

        assert!(!holder.update_if_current(&old, |_| Counter {
            value: 1,
            label: "stale".into()
        }));
        assert!(holder.update_if_current(&new, |_| Counter {
            value: 2,
            label: "fresh".into()
        }));
        assert_eq!(holder.snapshot().label, "fresh");
    }
}
