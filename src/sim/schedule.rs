//! Deferred actions tied to a session
//!
//! Each entry carries the session token it was scheduled under. Entries from
//! an older session are dropped unfired, so a reset can never be undone by
//! a late callback.

/// Actions that run some time after they are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Release the player's move lock once the hop animation settles
    FinishMove,
}

#[derive(Debug, Clone)]
struct Pending {
    due: f64,
    session: u64,
    action: Deferred,
}

/// Pending deferred actions, fired from the tick thread
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, session: u64, action: Deferred) {
        self.pending.push(Pending {
            due,
            session,
            action,
        });
    }

    /// Drop everything pending
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return actions due by `now` for `session`, in schedule
    /// order. Entries from other sessions are discarded.
    pub fn take_due(&mut self, now: f64, session: u64) -> Vec<Deferred> {
        let mut fired = Vec::new();
        self.pending.retain(|p| {
            if p.session != session {
                return false;
            }
            if p.due <= now {
                fired.push(p.action);
                return false;
            }
            true
        });
        fired
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_when_due() {
        let mut s = Scheduler::new();
        s.schedule(1.0, 1, Deferred::FinishMove);
        assert!(s.take_due(0.5, 1).is_empty());
        assert_eq!(s.len(), 1);
        assert_eq!(s.take_due(1.0, 1), vec![Deferred::FinishMove]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_stale_session_dropped() {
        let mut s = Scheduler::new();
        s.schedule(1.0, 1, Deferred::FinishMove);
        assert!(s.take_due(2.0, 2).is_empty());
        assert!(s.is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut s = Scheduler::new();
        s.schedule(1.0, 1, Deferred::FinishMove);
        s.schedule(2.0, 1, Deferred::FinishMove);
        s.cancel_all();
        assert!(s.take_due(5.0, 1).is_empty());
    }
}
