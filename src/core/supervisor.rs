//! Supervised execution of background tasks
//!
//! A panic inside a writer worker must not take the process, the calling
//! threads, or sibling writers down with it. `supervise` runs the task behind
//! `catch_unwind`, reports how it ended, and then always runs the cleanup step
//! (itself isolated) before returning.

use super::error::Result;
use super::metrics::WriterMetrics;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// How a supervised task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(String),
    Panicked(String),
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run `task` on `state`, then `cleanup` on the same state whatever happened.
pub fn supervise<S, T, C>(
    name: &str,
    metrics: &WriterMetrics,
    state: &mut S,
    task: T,
    cleanup: C,
) -> Outcome
where
    T: FnOnce(&mut S) -> Result<()>,
    C: FnOnce(&mut S),
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task(&mut *state))) {
        Ok(Ok(())) => Outcome::Completed,
        Ok(Err(e)) => {
            eprintln!("[LOGGER ERROR] Writer '{}' stopped: {}", name, e);
            Outcome::Failed(e.to_string())
        }
        Err(payload) => {
            metrics.record_panic();
            let msg = panic_message(payload.as_ref());
            eprintln!(
                "[LOGGER CRITICAL] Writer '{}' panicked: {}. \
                 Other writers continue to function.",
                name, msg
            );
            Outcome::Panicked(msg)
        }
    };

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| cleanup(&mut *state))) {
        metrics.record_panic();
        eprintln!(
            "[LOGGER CRITICAL] Writer '{}' panicked during cleanup: {}",
            name,
            panic_message(payload.as_ref())
        );
    }

    outcome
}
