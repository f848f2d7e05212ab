//! Fragment lifecycle seam
//!
//! The engine drives plan fragments through this trait: execute until a
//! terminal status, calling again after each suspension, and cancel to
//! abandon a scan.

use crate::types::Value;

use super::errors::ExecutorResult;
use super::result::InvocationResult;

/// A plan fragment the engine can run and suspend
pub trait FragmentExecutor {
    /// Run one invocation. Starts a new logical scan unless the previous
    /// invocation suspended.
    fn execute(&mut self, params: &[Value]) -> ExecutorResult<InvocationResult>;

    /// Returns true if invocations may end early with more rows pending
    fn is_suspendable(&self) -> bool;

    /// Discard the current logical scan
    fn cancel(&mut self);
}

/// Invoke `fragment` until its logical scan ends, collecting every invocation
pub fn run_to_completion<F: FragmentExecutor + ?Sized>(
    fragment: &mut F,
    params: &[Value],
) -> ExecutorResult<Vec<InvocationResult>> {
    let mut invocations = Vec::new();
    loop {
        let result = fragment.execute(params)?;
        let done = result.status.is_terminal();
        invocations.push(result);
        if done {
            return Ok(invocations);
        }
    }
}
