//! Carrying the active interactions over to work that runs later.

use std::rc::Rc;

use crate::TARGET;
use crate::deferred::Deferred;
use crate::error::TrackingResult;
use crate::interaction::{InteractionSet, ThreadId};
use crate::registry::Tracker;
use crate::subscriber::Subscriber;

/// Interactions captured for one unit of scheduled work.
pub(crate) struct Capture {
    pub(crate) tracker: Tracker,
    pub(crate) interactions: InteractionSet,
    pub(crate) thread_id: ThreadId,
    /// Pending work was counted for this capture and must be released once.
    pub(crate) counted: bool,
}

impl Tracker {
    /// Capture the ambient set for later work; `None` when tracking is disabled.
    ///
    /// A subscriber failure in `on_work_scheduled` propagates right away and no
    /// pending work is counted.
    pub(crate) fn capture(&self, thread_id: ThreadId) -> TrackingResult<Option<Capture>> {
        let config = self.config();
        if !config.enabled {
            return Ok(None);
        }

        let interactions = self.current_set();
        let counted = config.observer_enabled();
        if counted {
            if let Some(subscriber) = self.subscriber() {
                subscriber.on_work_scheduled(&interactions, thread_id)?;
            }
            for interaction in &interactions {
                interaction.increment_pending_work();
            }
        }

        tracing::trace!(
            target: TARGET,
            thread_id = thread_id.0,
            event_type = "scheduled",
            interaction_ids = ?interactions.ids(),
        );

        Ok(Some(Capture {
            tracker: self.clone(),
            interactions,
            thread_id,
            counted,
        }))
    }

    /// Release one unit of pending work for each interaction, notifying
    /// completion for those that reach zero.
    pub(crate) fn release_pending_work(
        interactions: &InteractionSet,
        subscriber: Option<&Rc<dyn Subscriber>>,
        deferred: &mut Deferred,
    ) {
        for interaction in interactions {
            match interaction.decrement_pending_work() {
                Some(0) => {
                    tracing::trace!(
                        target: TARGET,
                        interaction_id = interaction.id(),
                        event_type = "completed",
                    );
                    if let Some(subscriber) = subscriber {
                        deferred.notify(|| {
                            subscriber.on_interaction_scheduled_work_completed(interaction)
                        });
                    }
                }
                Some(_) => {}
                None => tracing::warn!(
                    target: TARGET,
                    interaction_id = interaction.id(),
                    "Pending work released more often than it was scheduled"
                ),
            }
        }
    }

    /// Wrap `callback` so it runs later with the interactions active right now.
    ///
    /// See [`Tracker::wrap_with_thread`].
    pub fn wrap<F>(&self, callback: F) -> TrackingResult<Wrapped<F>> {
        self.wrap_with_thread(ThreadId::DEFAULT, callback)
    }

    /// Wrap `callback` so it runs later with the interactions active right now.
    ///
    /// The ambient set is captured as-is, not copied, and each of its
    /// interactions gains one unit of pending work immediately, so none of them
    /// can complete before the wrapped work has run or been canceled.
    ///
    /// Unlike the other notifications, a failing `on_work_scheduled` is returned
    /// from here directly and nothing is counted.
    pub fn wrap_with_thread<F>(&self, thread_id: ThreadId, callback: F) -> TrackingResult<Wrapped<F>> {
        Ok(Wrapped {
            callback,
            capture: self.capture(thread_id)?,
        })
    }
}

impl Capture {
    /// Report cancellation and release pending work. Never raises.
    fn cancel(&mut self) -> Deferred {
        let mut deferred = Deferred::default();
        if !self.counted {
            return deferred;
        }
        self.counted = false;

        tracing::trace!(
            target: TARGET,
            thread_id = self.thread_id.0,
            event_type = "canceled",
            interaction_ids = ?self.interactions.ids(),
        );

        let subscriber = self.tracker.subscriber();
        if let Some(subscriber) = &subscriber {
            deferred.notify(|| subscriber.on_work_canceled(&self.interactions, self.thread_id));
        }
        Tracker::release_pending_work(&self.interactions, subscriber.as_ref(), &mut deferred);
        deferred
    }

    /// Cancel work that is being dropped without having run.
    pub(crate) fn cancel_on_drop(&mut self) {
        if self.counted {
            tracing::debug!(
                target: TARGET,
                thread_id = self.thread_id.0,
                "Scheduled work dropped without running, canceling"
            );
            self.cancel()
                .discard("Subscriber failed while canceling dropped work");
        }
    }
}

/// A callback bound to the interactions that were active when it was wrapped.
///
/// Each call installs those interactions, brackets the callback with
/// `on_work_started`/`on_work_stopped` and releases one unit of pending work per
/// interaction. [`Wrapped::cancel`] releases the work without running anything.
/// Dropping a `Wrapped` that was never called cancels it.
#[must_use = "scheduled work keeps its interactions pending until it is called or canceled"]
pub struct Wrapped<F> {
    callback: F,
    capture: Option<Capture>,
}

impl<F> Wrapped<F> {
    /// The interactions this callback runs under; `None` when tracking is disabled.
    pub fn interactions(&self) -> Option<&InteractionSet> {
        self.capture.as_ref().map(|capture| &capture.interactions)
    }

    pub fn thread_id(&self) -> Option<ThreadId> {
        self.capture.as_ref().map(|capture| capture.thread_id)
    }

    /// Run the callback.
    pub fn call<R>(&mut self) -> TrackingResult<R>
    where
        F: FnMut() -> R,
    {
        self.invoke(|callback| callback())
    }

    /// Run the callback with `args`.
    pub fn call_with<A, R>(&mut self, args: A) -> TrackingResult<R>
    where
        F: FnMut(A) -> R,
    {
        self.invoke(move |callback| callback(args))
    }

    fn invoke<R>(&mut self, run: impl FnOnce(&mut F) -> R) -> TrackingResult<R> {
        let Self { callback, capture } = self;
        let Some(capture) = capture.as_mut() else {
            return Ok(run(callback));
        };

        let tracker = capture.tracker.clone();
        let scope = tracker.enter(capture.interactions.clone());

        if !tracker.config().observer_enabled() {
            return Ok(run(callback));
        }

        let interactions = &capture.interactions;
        let thread_id = capture.thread_id;
        let subscriber = tracker.subscriber();
        let mut deferred = Deferred::default();

        if let Some(subscriber) = &subscriber {
            deferred.notify(|| subscriber.on_work_started(interactions, thread_id));
        }

        let value = deferred.run(|| run(callback));
        drop(scope);

        if let Some(subscriber) = &subscriber {
            deferred.notify(|| subscriber.on_work_stopped(interactions, thread_id));
        }

        // Each call releases the work it was scheduled for
        capture.counted = false;
        Tracker::release_pending_work(interactions, subscriber.as_ref(), &mut deferred);

        deferred.finish(value)
    }

    /// Drop the work without running it.
    ///
    /// Notifies `on_work_canceled`, then releases the pending work, completing any
    /// interaction with nothing else outstanding. A subscriber failure is returned
    /// after all of that has happened.
    pub fn cancel(mut self) -> TrackingResult<()> {
        match self.capture.as_mut() {
            Some(capture) => capture.cancel().finish(Some(())),
            None => Ok(()),
        }
    }
}

impl<F> Drop for Wrapped<F> {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.as_mut() {
            capture.cancel_on_drop();
        }
    }
}

impl<F> std::fmt::Debug for Wrapped<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wrapped")
            .field("interactions", &self.interactions())
            .field("thread_id", &self.thread_id())
            .finish_non_exhaustive()
    }
}
