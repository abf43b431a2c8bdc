//! The observer interface notified as interactions and their work progress.

use serde::{Deserialize, Serialize};

use crate::error::SubscriberError;
use crate::interaction::{Interaction, InteractionSet, ThreadId};

/// Names the six [`Subscriber`] notifications.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    InteractionTracked,
    InteractionScheduledWorkCompleted,
    WorkScheduled,
    WorkCanceled,
    WorkStarted,
    WorkStopped,
}

/// Receives lifecycle notifications from a [`Tracker`](crate::Tracker).
///
/// At most one subscriber is registered per tracker. Every method defaults to
/// doing nothing. Returning an error (or panicking) never prevents the tracker
/// from restoring its context or releasing pending work; the first failure is
/// handed back to whoever triggered the notification once cleanup has run.
///
/// `on_work_started`/`on_work_stopped` bracket each synchronous run of tracked or
/// wrapped work. Yielding work may start and stop several times for the same set
/// before its interactions complete.
#[allow(unused_variables)]
pub trait Subscriber {
    /// A new interaction was created by `track`.
    fn on_interaction_tracked(&self, interaction: &Interaction) -> Result<(), SubscriberError> {
        Ok(())
    }

    /// The last outstanding unit of work for `interaction` finished or was canceled.
    fn on_interaction_scheduled_work_completed(
        &self,
        interaction: &Interaction,
    ) -> Result<(), SubscriberError> {
        Ok(())
    }

    /// Work was captured for later execution on `thread_id`.
    fn on_work_scheduled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        Ok(())
    }

    /// Scheduled work was dropped without running.
    fn on_work_canceled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        Ok(())
    }

    fn on_work_started(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        Ok(())
    }

    fn on_work_stopped(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        Ok(())
    }
}
