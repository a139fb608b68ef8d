//! Step-local failure for one collaborator call.
//!
//! Lets the job treat "the call failed" and "the call ran out of time" the
//! same way per identity while still logging them distinctly.

use std::fmt;
use std::time::Duration;

pub(super) enum StepError<E> {
    Failed(E),
    TimedOut(Duration),
}

impl<E: fmt::Display> fmt::Display for StepError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(error) => error.fmt(f),
            Self::TimedOut(timeout) => write!(f, "no response within {timeout:?}"),
        }
    }
}
