//! Interaction tracking: attribute scheduled work to the interactions that caused it.
//!
//! An *interaction* is a named, timestamped cause (a click, a navigation).
//! [`track`] makes a new interaction active while a callback runs, [`wrap`]
//! carries the active interactions over to a callback that runs later, and a
//! [`Subscriber`] hears about every step until each interaction has no
//! outstanding work left.
//!
//! ## Usage
//!
//! ```ignore
//! use std::rc::Rc;
//! use interaction_tracking::{self as tracking, LoggingSubscriber};
//!
//! tracking::subscribe(Rc::new(LoggingSubscriber))?;
//!
//! let mut on_response = tracking::track("submit", tracking::now_millis(), || {
//!     // Runs later, still attributed to "submit"
//!     tracking::wrap(|| render_result())
//! })??;
//!
//! scheduler.defer(move || on_response.call());
//! ```
//!
//! The free functions act on the calling thread's default [`Tracker`]. Build a
//! [`Tracker`] directly to get an isolated context.

mod channel;
mod config;
mod deferred;
mod error;
mod events;
mod instrument;
mod interaction;
mod logging;
mod registry;
mod scope;
mod subscriber;
mod timestamp;
mod track;
mod wrap;

#[cfg(test)]
mod test_support;

use std::rc::Rc;

pub use channel::{ChannelSubscriber, init};
pub use config::{ENV_OBSERVER, ENV_TRACKING, TrackingConfig};
pub use error::{SubscriberError, TrackingError, TrackingResult};
pub use events::{EventSink, InteractionEvent, InteractionSnapshot};
pub use instrument::{InteractionInstrument, Tracked};
pub use interaction::{Interaction, InteractionSet, ThreadId};
pub use logging::{EVENTS_TARGET, LoggingSubscriber};
pub use registry::{Tracker, default_tracker, set_default_tracker};
pub use subscriber::{NotificationKind, Subscriber};
pub use timestamp::{Timestamp, now_millis};
pub use wrap::Wrapped;

// Re-export macros
pub use interaction_tracking_macros::tracked;

/// Target of the crate's own lifecycle logging.
pub(crate) const TARGET: &str = "interaction_tracking";

/// Track a new interaction on the default tracker. See [`Tracker::track`].
pub fn track<F, R>(name: impl Into<String>, timestamp: f64, callback: F) -> TrackingResult<R>
where
    F: FnOnce() -> R,
{
    default_tracker().track(name, timestamp, callback)
}

/// See [`Tracker::track_with_thread`].
pub fn track_with_thread<F, R>(
    name: impl Into<String>,
    timestamp: f64,
    thread_id: ThreadId,
    callback: F,
) -> TrackingResult<R>
where
    F: FnOnce() -> R,
{
    default_tracker().track_with_thread(name, timestamp, thread_id, callback)
}

/// Wrap `callback` on the default tracker. See [`Tracker::wrap`].
pub fn wrap<F>(callback: F) -> TrackingResult<Wrapped<F>> {
    default_tracker().wrap(callback)
}

/// See [`Tracker::wrap_with_thread`].
pub fn wrap_with_thread<F>(thread_id: ThreadId, callback: F) -> TrackingResult<Wrapped<F>> {
    default_tracker().wrap_with_thread(thread_id, callback)
}

/// Run `callback` with no interactions active. See [`Tracker::clear`].
pub fn clear<F, R>(callback: F) -> R
where
    F: FnOnce() -> R,
{
    default_tracker().clear(callback)
}

/// The default tracker's ambient interactions, `None` when tracking is disabled.
pub fn get_current() -> Option<InteractionSet> {
    default_tracker().get_current()
}

pub fn subscribe(subscriber: Rc<dyn Subscriber>) -> TrackingResult<()> {
    default_tracker().subscribe(subscriber)
}

pub fn unsubscribe<S: Subscriber + ?Sized>(subscriber: &Rc<S>) {
    default_tracker().unsubscribe(subscriber)
}

pub fn next_thread_id() -> ThreadId {
    default_tracker().next_thread_id()
}
