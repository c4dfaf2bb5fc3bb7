//! A single deadline enclosing every suspension point of a session.
//!
//! Grounded on the design note in `SPEC_FULL.md` §4.5/§9: "OS threads +
//! blocking I/O with a monotonic deadline checked at each turn", the same
//! shape `ark_test::DapClient` gets from `TcpStream::set_read_timeout`
//! (`posit-dev-ark/crates/ark_test/src/dap_client.rs`), adapted here to a
//! channel `recv_timeout` since the transport is a child process's stdio.

use std::time::{Duration, Instant};

/// Tracks an optional wall-clock budget for a session and hands out the
/// remaining time before each suspension point.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGate {
    deadline: Option<Instant>,
}

impl TimeoutGate {
    /// `budget` of `None` means no timeout is enforced.
    pub fn new(budget: Option<Duration>) -> Self {
        TimeoutGate { deadline: budget.map(|budget| Instant::now() + budget) }
    }

    /// Time left before the deadline, or a very long duration if there is no
    /// deadline. Returns `Duration::ZERO` if the deadline has already
    /// passed, so callers can treat `Duration::ZERO` as "expired" uniformly.
    pub fn remaining(&self) -> Duration {
        match self.deadline {
            None => Duration::from_secs(u32::MAX as u64),
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
        }
    }

    /// Whether the budget, if any, has been exhausted.
    pub fn expired(&self) -> bool {
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_budget_never_expires() {
        let gate = TimeoutGate::new(None);
        assert!(!gate.expired());
        assert!(gate.remaining() > Duration::from_secs(60));
    }

    #[test]
    fn expired_budget_reports_zero_remaining() {
        let gate = TimeoutGate::new(Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(gate.expired());
        assert_eq!(gate.remaining(), Duration::ZERO);
    }

    #[test]
    fn unexpired_budget_reports_bounded_remaining() {
        let gate = TimeoutGate::new(Some(Duration::from_secs(10)));
        assert!(!gate.expired());
        assert!(gate.remaining() <= Duration::from_secs(10));
        assert!(gate.remaining() > Duration::from_secs(9));
    }
}
