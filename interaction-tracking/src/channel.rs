//! Forwarding notifications over a channel.
//!
//! # Usage
//!
//! ```rust,ignore
//! let (mut rx, subscriber) = interaction_tracking::init();
//!
//! // Register with a tracker; notifications now flow into the channel
//! subscriber.install(&tracker)?;
//!
//! // Hand the receiver to whatever consumes the events, possibly on another thread
//! while let Some(event) = rx.recv().await {
//!     // Handle event
//! }
//! ```

use std::rc::Rc;

use tokio::sync::mpsc;

use crate::error::{SubscriberError, TrackingResult};
use crate::events::{EventSink, InteractionEvent};
use crate::registry::Tracker;
use crate::subscriber::Subscriber;

/// Subscriber that sends every notification as an [`InteractionEvent`].
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<InteractionEvent>,
}

impl ChannelSubscriber {
    /// Register this subscriber with `tracker`.
    ///
    /// Returns the registered handle, which is what to pass to
    /// [`Tracker::unsubscribe`] later.
    pub fn install(self, tracker: &Tracker) -> TrackingResult<Rc<dyn Subscriber>> {
        let subscriber: Rc<dyn Subscriber> = Rc::new(self);
        tracker.subscribe(subscriber.clone())?;
        Ok(subscriber)
    }
}

impl EventSink for ChannelSubscriber {
    fn emit(&self, event: InteractionEvent) -> Result<(), SubscriberError> {
        self.tx.send(event).map_err(|_| SubscriberError::Channel)
    }
}

/// Create the event channel.
/// Returns the receiving end and a subscriber feeding it.
pub fn init() -> (mpsc::UnboundedReceiver<InteractionEvent>, ChannelSubscriber) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, ChannelSubscriber { tx })
}
