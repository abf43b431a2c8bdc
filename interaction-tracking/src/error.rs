use miette::Diagnostic;
use thiserror::Error;

use crate::subscriber::NotificationKind;

#[derive(Error, Diagnostic, Debug)]
pub enum TrackingError {
    #[error("Only one interactions subscriber may be registered at a time")]
    #[diagnostic(
        code(interaction_tracking::subscriber_already_registered),
        help("unsubscribe the current subscriber before registering another one")
    )]
    SubscriberAlreadyRegistered,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Subscriber(#[from] SubscriberError),
}

/// Failure reported by a [`Subscriber`](crate::Subscriber) notification.
#[derive(Error, Diagnostic, Debug)]
pub enum SubscriberError {
    #[error("Subscriber failed in {method}: {message}")]
    #[diagnostic(code(interaction_tracking::subscriber_failed))]
    Failed {
        method: NotificationKind,
        message: String,
    },

    #[error("Interaction event channel is closed")]
    #[diagnostic(code(interaction_tracking::channel_closed))]
    Channel,
}

impl SubscriberError {
    pub fn failed<S: ToString>(method: NotificationKind, message: S) -> Self {
        Self::Failed {
            method,
            message: message.to_string(),
        }
    }
}

pub type TrackingResult<T> = std::result::Result<T, TrackingError>;
