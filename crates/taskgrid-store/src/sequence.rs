//! Response ordering guard.
//!
//! Every fetch takes a [`Ticket`] before it suspends. When the response lands
//! the store applies it only if no newer ticket has been applied already, so a
//! slow early response can never overwrite a fast later one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issuance position of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Position in issuance order, starting at 1.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tickets and tracks the newest applied one.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RequestSequencer {
    /// Sequencer with nothing issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    /// Take the next ticket.
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Mark `ticket` applied if it is newer than every applied ticket.
    ///
    /// Returns `false` for a stale ticket, which must then be discarded.
    pub fn try_apply(&self, ticket: Ticket) -> bool {
        self.applied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                (ticket.0 > last).then_some(ticket.0)
            })
            .is_ok()
    }

    /// Retire every ticket issued so far. Their responses will be discarded.
    pub fn fence(&self) {
        let issued = self.issued.load(Ordering::SeqCst);
        self.applied.fetch_max(issued, Ordering::SeqCst);
    }

    /// Newest applied ticket value, `0` before the first apply.
    #[must_use]
    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_increase() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();
        assert!(second > first);
        assert_eq!(first.value(), 1);
    }

    #[test]
    fn older_ticket_is_rejected_after_newer_applies() {
        let sequencer = RequestSequencer::new();
        let slow = sequencer.issue();
        let fast = sequencer.issue();
        assert!(sequencer.try_apply(fast));
        assert!(!sequencer.try_apply(slow));
        assert_eq!(sequencer.last_applied(), fast.value());
    }

    #[test]
    fn in_order_responses_all_apply() {
        let sequencer = RequestSequencer::new();
        let tickets: Vec<_> = (0..3).map(|_| sequencer.issue()).collect();
        assert!(tickets.into_iter().all(|ticket| sequencer.try_apply(ticket)));
    }

    #[test]
    fn same_ticket_applies_once() {
        let sequencer = RequestSequencer::new();
        let ticket = sequencer.issue();
        assert!(sequencer.try_apply(ticket));
        assert!(!sequencer.try_apply(ticket));
    }

    #[test]
    fn fence_retires_outstanding_tickets() {
        let sequencer = RequestSequencer::new();
        let outstanding = sequencer.issue();
        sequencer.fence();
        assert!(!sequencer.try_apply(outstanding));

        let next = sequencer.issue();
        assert!(sequencer.try_apply(next));
    }
}
