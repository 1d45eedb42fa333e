//! Loading flag shared by overlapping user-triggered fetches.
//!
//! The flag rises with the first fetch and falls only when the last one
//! settles. Guards release on drop, so a cancelled fetch cannot leave the
//! flag stuck.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// State carrying a loading flag.
pub(crate) trait LoadingState {
    fn loading_mut(&mut self) -> &mut bool;
}

/// Counts user-triggered fetches in flight for one store.
#[derive(Debug, Default)]
pub(crate) struct LoadingTracker {
    in_flight: AtomicUsize,
}

impl LoadingTracker {
    pub(crate) const fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Raise the flag until the returned guard, and every other live guard,
    /// is dropped.
    pub(crate) fn enter<'a, S: LoadingState>(
        &'a self,
        state: &'a watch::Sender<S>,
    ) -> LoadingGuard<'a, S> {
        state.send_if_modified(|current| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            !std::mem::replace(current.loading_mut(), true)
        });
        LoadingGuard {
            tracker: self,
            state,
        }
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Keeps the loading flag raised while alive.
pub(crate) struct LoadingGuard<'a, S: LoadingState> {
    tracker: &'a LoadingTracker,
    state: &'a watch::Sender<S>,
}

impl<S: LoadingState> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        let tracker = self.tracker;
        self.state.send_if_modified(|current| {
            let remaining = tracker
                .in_flight
                .fetch_sub(1, Ordering::SeqCst)
                .saturating_sub(1);
            remaining == 0 && std::mem::replace(current.loading_mut(), false)
        });
    }
}
