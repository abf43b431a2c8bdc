//! Serializable records of subscriber notifications.
//!
//! Any [`EventSink`] is a [`Subscriber`]: each notification is turned into an
//! [`InteractionEvent`] snapshot and handed to [`EventSink::emit`]. The channel
//! and logging subscribers are both built this way.

use serde::{Deserialize, Serialize};

use crate::Timestamp;
use crate::error::SubscriberError;
use crate::interaction::{Interaction, InteractionSet, ThreadId};
use crate::subscriber::{NotificationKind, Subscriber};

/// Owned copy of an interaction's identity, detached from its counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSnapshot {
    pub id: u64,
    pub name: String,
    pub timestamp: f64,
}

impl From<&Interaction> for InteractionSnapshot {
    fn from(interaction: &Interaction) -> Self {
        Self {
            id: interaction.id(),
            name: interaction.name().to_string(),
            timestamp: interaction.timestamp(),
        }
    }
}

fn snapshot_set(interactions: &InteractionSet) -> Vec<InteractionSnapshot> {
    interactions.iter().map(InteractionSnapshot::from).collect()
}

/// One subscriber notification. `at` is when the notification fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InteractionEvent {
    Tracked {
        interaction: InteractionSnapshot,
        at: Timestamp,
    },
    ScheduledWorkCompleted {
        interaction: InteractionSnapshot,
        at: Timestamp,
    },
    WorkScheduled {
        interactions: Vec<InteractionSnapshot>,
        thread_id: ThreadId,
        at: Timestamp,
    },
    WorkCanceled {
        interactions: Vec<InteractionSnapshot>,
        thread_id: ThreadId,
        at: Timestamp,
    },
    WorkStarted {
        interactions: Vec<InteractionSnapshot>,
        thread_id: ThreadId,
        at: Timestamp,
    },
    WorkStopped {
        interactions: Vec<InteractionSnapshot>,
        thread_id: ThreadId,
        at: Timestamp,
    },
}

impl InteractionEvent {
    /// The notification this event records.
    pub fn kind(&self) -> NotificationKind {
        match self {
            InteractionEvent::Tracked { .. } => NotificationKind::InteractionTracked,
            InteractionEvent::ScheduledWorkCompleted { .. } => {
                NotificationKind::InteractionScheduledWorkCompleted
            }
            InteractionEvent::WorkScheduled { .. } => NotificationKind::WorkScheduled,
            InteractionEvent::WorkCanceled { .. } => NotificationKind::WorkCanceled,
            InteractionEvent::WorkStarted { .. } => NotificationKind::WorkStarted,
            InteractionEvent::WorkStopped { .. } => NotificationKind::WorkStopped,
        }
    }

    /// Ids of every interaction the event refers to.
    pub fn interaction_ids(&self) -> Vec<u64> {
        match self {
            InteractionEvent::Tracked { interaction, .. }
            | InteractionEvent::ScheduledWorkCompleted { interaction, .. } => {
                vec![interaction.id]
            }
            InteractionEvent::WorkScheduled { interactions, .. }
            | InteractionEvent::WorkCanceled { interactions, .. }
            | InteractionEvent::WorkStarted { interactions, .. }
            | InteractionEvent::WorkStopped { interactions, .. } => {
                interactions.iter().map(|snapshot| snapshot.id).collect()
            }
        }
    }
}

/// Destination for [`InteractionEvent`]s.
pub trait EventSink {
    fn emit(&self, event: InteractionEvent) -> Result<(), SubscriberError>;
}

impl<T: EventSink> Subscriber for T {
    fn on_interaction_tracked(&self, interaction: &Interaction) -> Result<(), SubscriberError> {
        self.emit(InteractionEvent::Tracked {
            interaction: interaction.into(),
            at: Timestamp::now(),
        })
    }

    fn on_interaction_scheduled_work_completed(
        &self,
        interaction: &Interaction,
    ) -> Result<(), SubscriberError> {
        self.emit(InteractionEvent::ScheduledWorkCompleted {
            interaction: interaction.into(),
            at: Timestamp::now(),
        })
    }

    fn on_work_scheduled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.emit(InteractionEvent::WorkScheduled {
            interactions: snapshot_set(interactions),
            thread_id,
            at: Timestamp::now(),
        })
    }

    fn on_work_canceled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.emit(InteractionEvent::WorkCanceled {
            interactions: snapshot_set(interactions),
            thread_id,
            at: Timestamp::now(),
        })
    }

    fn on_work_started(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.emit(InteractionEvent::WorkStarted {
            interactions: snapshot_set(interactions),
            thread_id,
            at: Timestamp::now(),
        })
    }

    fn on_work_stopped(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.emit(InteractionEvent::WorkStopped {
            interactions: snapshot_set(interactions),
            thread_id,
            at: Timestamp::now(),
        })
    }
}
