//! Cooperative suspension
//!
//! Counts candidate rows taken from the cursor in the current invocation.
//! A suspendable scan yields once the count reaches the threshold; a
//! non-suspendable scan never does.

/// Per-invocation row budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspensionController {
    suspendable: bool,
    threshold: u64,
    taken: u64,
}

impl SuspensionController {
    /// A controller that never suspends
    pub fn never() -> Self {
        Self {
            suspendable: false,
            threshold: u64::MAX,
            taken: 0,
        }
    }

    /// A controller that suspends after `threshold` rows per invocation.
    ///
    /// `threshold` must be positive; the executor rejects anything else at init.
    pub fn suspending_after(threshold: u64) -> Self {
        Self {
            suspendable: true,
            threshold: threshold.max(1),
            taken: 0,
        }
    }

    /// Start counting a new invocation
    pub fn begin_invocation(&mut self) {
        self.taken = 0;
    }

    /// Returns true if the next candidate must wait for the next invocation
    pub fn should_suspend(&self) -> bool {
        self.suspendable && self.taken >= self.threshold
    }

    /// Count one candidate row
    pub fn record(&mut self) {
        self.taken += 1;
    }

    pub fn is_suspendable(&self) -> bool {
        self.suspendable
    }

    pub fn threshold(&self) -> Option<u64> {
        self.suspendable.then_some(self.threshold)
    }

    /// Rows counted in this invocation
    pub fn taken(&self) -> u64 {
        self.taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_suspends() {
        let mut controller = SuspensionController::never();
        for _ in 0..10_000 {
            assert!(!controller.should_suspend());
            controller.record();
        }
        assert_eq!(controller.threshold(), None);
    }

    #[test]
    fn test_suspends_at_threshold() {
        let mut controller = SuspensionController::suspending_after(2);
        assert!(!controller.should_suspend());
        controller.record();
        assert!(!controller.should_suspend());
        controller.record();
        assert!(controller.should_suspend());

        controller.begin_invocation();
        assert!(!controller.should_suspend());
        assert_eq!(controller.taken(), 0);
    }
}
