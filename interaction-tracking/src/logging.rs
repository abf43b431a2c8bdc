//! Subscriber exporting notifications to `tracing`.

use crate::error::SubscriberError;
use crate::events::{EventSink, InteractionEvent};

/// Target of the events emitted by [`LoggingSubscriber`].
pub const EVENTS_TARGET: &str = "interaction_tracking::events";

/// Emits every notification as a JSON-serialized `trace` event, for file export
/// through whatever `tracing` layers are installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubscriber;

impl EventSink for LoggingSubscriber {
    fn emit(&self, event: InteractionEvent) -> Result<(), SubscriberError> {
        let json = serde_json::to_string(&event)
            .map_err(|err| SubscriberError::failed(event.kind(), err))?;
        tracing::trace!(target: EVENTS_TARGET, event = json.as_str());
        Ok(())
    }
}
