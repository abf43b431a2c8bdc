//! First-failure-wins accumulator for notification call sites.
//!
//! Panics are the Rust rendition of a thrown exception here: a panicking
//! callback or subscriber is caught, cleanup continues, and the panic resumes
//! once everything has run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::TARGET;
use crate::error::{SubscriberError, TrackingResult};

pub(crate) enum Failure {
    Subscriber(SubscriberError),
    Panic(Box<dyn Any + Send>),
}

impl Failure {
    fn describe(&self) -> String {
        match self {
            Failure::Subscriber(err) => err.to_string(),
            Failure::Panic(payload) => {
                if let Some(message) = payload.downcast_ref::<&str>() {
                    format!("panic: {message}")
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    format!("panic: {message}")
                } else {
                    "panic with a non-string payload".to_string()
                }
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct Deferred {
    first: Option<Failure>,
}

impl Deferred {
    /// Run a subscriber notification, keeping its failure for later.
    pub(crate) fn notify<F>(&mut self, notification: F)
    where
        F: FnOnce() -> Result<(), SubscriberError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(notification)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.capture(Failure::Subscriber(err)),
            Err(payload) => self.capture(Failure::Panic(payload)),
        }
    }

    /// Run user work, keeping a panic for later. `None` means it panicked.
    pub(crate) fn run<F, R>(&mut self, work: F) -> Option<R>
    where
        F: FnOnce() -> R,
    {
        match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(value) => Some(value),
            Err(payload) => {
                self.capture(Failure::Panic(payload));
                None
            }
        }
    }

    fn capture(&mut self, failure: Failure) {
        if self.first.is_some() {
            tracing::warn!(
                target: TARGET,
                failure = %failure.describe(),
                "Discarding failure raised after an earlier one"
            );
            return;
        }
        self.first = Some(failure);
    }

    /// Re-raise the first failure, or hand back `value`.
    pub(crate) fn finish<R>(self, value: Option<R>) -> TrackingResult<R> {
        match (self.first, value) {
            (Some(Failure::Panic(payload)), _) => panic::resume_unwind(payload),
            (Some(Failure::Subscriber(err)), _) => Err(err.into()),
            (None, Some(value)) => Ok(value),
            (None, None) => unreachable!("work produced neither a value nor a failure"),
        }
    }

    /// Log the first failure instead of raising it, for cleanup in `Drop`.
    pub(crate) fn discard(self, context: &str) {
        if let Some(failure) = self.first {
            tracing::warn!(
                target: TARGET,
                failure = %failure.describe(),
                "{context}"
            );
        }
    }
}
