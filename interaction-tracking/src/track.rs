//! Creating interactions and running work on their behalf.

use crate::TARGET;
use crate::deferred::Deferred;
use crate::error::TrackingResult;
use crate::interaction::{Interaction, ThreadId};
use crate::registry::Tracker;

impl Tracker {
    /// Track a new interaction for the duration of `callback`.
    ///
    /// See [`Tracker::track_with_thread`].
    pub fn track<F, R>(
        &self,
        name: impl Into<String>,
        timestamp: f64,
        callback: F,
    ) -> TrackingResult<R>
    where
        F: FnOnce() -> R,
    {
        self.track_with_thread(name, timestamp, ThreadId::DEFAULT, callback)
    }

    /// Track a new interaction for the duration of `callback`, on `thread_id`.
    ///
    /// The new interaction joins whatever interactions are already active, so
    /// nested calls accumulate. While `callback` runs the interaction holds one
    /// unit of pending work; work wrapped inside `callback` adds more. Once the
    /// count drops back to zero the subscriber hears
    /// `on_interaction_scheduled_work_completed`.
    ///
    /// A panic in `callback` or in the subscriber is resumed, and a subscriber
    /// error returned, only after the previous interactions are restored and every
    /// remaining notification has fired. The first failure wins.
    pub fn track_with_thread<F, R>(
        &self,
        name: impl Into<String>,
        timestamp: f64,
        thread_id: ThreadId,
        callback: F,
    ) -> TrackingResult<R>
    where
        F: FnOnce() -> R,
    {
        let config = self.config();
        if !config.enabled {
            return Ok(callback());
        }

        let interaction = Interaction::new(self.next_interaction_id(), name.into(), timestamp);
        let interactions = self.current_set().with(interaction.clone());

        tracing::trace!(
            target: TARGET,
            interaction_id = interaction.id(),
            thread_id = thread_id.0,
            event_type = "tracked",
            name = %interaction.name(),
            timestamp = interaction.timestamp(),
        );

        if !config.observer_enabled() {
            let _scope = self.enter(interactions);
            return Ok(callback());
        }

        // Nonzero before any notification, so work scheduled from inside a
        // subscriber cannot complete the interaction early.
        interaction.set_pending_work(1);

        let scope = self.enter(interactions.clone());
        let subscriber = self.subscriber();
        let mut deferred = Deferred::default();

        if let Some(subscriber) = &subscriber {
            deferred.notify(|| {
                subscriber.on_interaction_tracked(&interaction)?;
                subscriber.on_work_started(&interactions, thread_id)
            });
        }

        let value = deferred.run(callback);
        drop(scope);

        if let Some(subscriber) = &subscriber {
            deferred.notify(|| subscriber.on_work_stopped(&interactions, thread_id));
        }

        if interaction.decrement_pending_work() == Some(0) {
            tracing::trace!(
                target: TARGET,
                interaction_id = interaction.id(),
                event_type = "completed",
            );
            if let Some(subscriber) = &subscriber {
                deferred.notify(|| subscriber.on_interaction_scheduled_work_completed(&interaction));
            }
        }

        deferred.finish(value)
    }
}
