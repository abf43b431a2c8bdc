//! Extension trait for running futures under captured interactions.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::deferred::Deferred;
use crate::error::TrackingResult;
use crate::interaction::ThreadId;
use crate::registry::Tracker;
use crate::wrap::Capture;

/// Extension trait for attributing a future's work to the active interactions.
///
/// Creating the instrumented future schedules work the same way
/// [`Tracker::wrap`] does. Every poll then runs with the captured interactions
/// installed and is bracketed by `on_work_started`/`on_work_stopped`, so a future
/// that yields three times starts and stops three times. Pending work is released
/// once, when the future completes or panics, or when it is dropped early (as a
/// cancel).
///
/// # Example
/// ```ignore
/// use interaction_tracking::{InteractionInstrument, ThreadId};
///
/// let fut = tracker.track("load", 0.0, || {
///     fetch_profile().in_interactions(&tracker, ThreadId::DEFAULT)
/// })??;
/// let profile = fut.await?;
/// ```
pub trait InteractionInstrument: Future + Sized {
    fn in_interactions(self, tracker: &Tracker, thread_id: ThreadId) -> TrackingResult<Tracked<Self>> {
        Ok(Tracked {
            inner: Box::pin(self),
            capture: tracker.capture(thread_id)?,
            deferred: Deferred::default(),
        })
    }
}

impl<F: Future> InteractionInstrument for F {}

/// Future returned by [`InteractionInstrument::in_interactions`].
#[must_use = "futures do nothing unless polled"]
pub struct Tracked<F> {
    inner: Pin<Box<F>>,
    capture: Option<Capture>,
    /// Subscriber failures from earlier polls, surfaced on completion.
    deferred: Deferred,
}

impl<F: Future> Future for Tracked<F> {
    type Output = TrackingResult<F::Output>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let Some(capture) = this.capture.as_mut() else {
            return this.inner.as_mut().poll(cx).map(Ok);
        };

        let tracker = capture.tracker.clone();
        let scope = tracker.enter(capture.interactions.clone());

        if !tracker.config().observer_enabled() {
            return this.inner.as_mut().poll(cx).map(Ok);
        }

        let subscriber = tracker.subscriber();
        if let Some(subscriber) = &subscriber {
            this.deferred
                .notify(|| subscriber.on_work_started(&capture.interactions, capture.thread_id));
        }

        let inner = &mut this.inner;
        let poll = this.deferred.run(|| inner.as_mut().poll(cx));
        drop(scope);

        if let Some(subscriber) = &subscriber {
            this.deferred
                .notify(|| subscriber.on_work_stopped(&capture.interactions, capture.thread_id));
        }

        // A panicking poll finishes the work as much as a ready one does
        let output = match poll {
            Some(Poll::Pending) => return Poll::Pending,
            Some(Poll::Ready(output)) => Some(output),
            None => None,
        };

        capture.counted = false;
        Tracker::release_pending_work(&capture.interactions, subscriber.as_ref(), &mut this.deferred);
        Poll::Ready(std::mem::take(&mut this.deferred).finish(output))
    }
}

impl<F> Drop for Tracked<F> {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.as_mut() {
            capture.cancel_on_drop();
        }
        std::mem::take(&mut self.deferred)
            .discard("Subscriber failed while polling work that was dropped before completing");
    }
}

impl<F> Unpin for Tracked<F> {}
