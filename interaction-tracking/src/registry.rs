//! The tracker context: ambient interaction set, subscriber slot and id counters.

use std::cell::RefCell;
use std::rc::Rc;

use crate::TARGET;
use crate::config::TrackingConfig;
use crate::error::{TrackingError, TrackingResult};
use crate::interaction::{IdCounters, InteractionSet, ThreadId};
use crate::subscriber::Subscriber;

// Per-thread default tracker used by the free functions in the crate root.
thread_local! {
    static DEFAULT_TRACKER: RefCell<Tracker> =
        RefCell::new(Tracker::new(TrackingConfig::from_env()));
}

/// Handle to one interaction-tracking context.
///
/// A tracker is confined to the thread that created it: the ambient set is only
/// ever mutated during synchronous sections on that thread. Clones share the same
/// state, which is how wrapped callbacks reach back into their tracker later.
#[derive(Clone)]
pub struct Tracker {
    inner: Rc<TrackerInner>,
}

struct TrackerInner {
    config: TrackingConfig,
    current: RefCell<InteractionSet>,
    subscriber: RefCell<Option<Rc<dyn Subscriber>>>,
    ids: IdCounters,
}

impl Tracker {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            inner: Rc::new(TrackerInner {
                config,
                current: RefCell::new(InteractionSet::new()),
                subscriber: RefCell::new(None),
                ids: IdCounters::default(),
            }),
        }
    }

    /// A tracker on which every operation passes straight through.
    pub fn disabled() -> Self {
        Self::new(TrackingConfig::DISABLED)
    }

    pub fn config(&self) -> TrackingConfig {
        self.inner.config
    }

    /// The ambient interaction set, or `None` when tracking is disabled.
    pub fn get_current(&self) -> Option<InteractionSet> {
        self.inner.config.enabled.then(|| self.current_set())
    }

    pub(crate) fn current_set(&self) -> InteractionSet {
        self.inner.current.borrow().clone()
    }

    /// Replace the ambient set, returning the one it replaced.
    pub(crate) fn set_current(&self, interactions: InteractionSet) -> InteractionSet {
        self.inner.current.replace(interactions)
    }

    /// Register the subscriber.
    ///
    /// Registering the subscriber that is already registered is a no-op; any
    /// other subscriber is rejected until the current one is removed. Without
    /// observer support this does nothing.
    pub fn subscribe(&self, subscriber: Rc<dyn Subscriber>) -> TrackingResult<()> {
        if !self.inner.config.observer_enabled() {
            return Ok(());
        }

        let mut slot = self.inner.subscriber.borrow_mut();
        if let Some(existing) = slot.as_ref()
            && !Rc::ptr_eq(existing, &subscriber)
        {
            return Err(TrackingError::SubscriberAlreadyRegistered);
        }
        *slot = Some(subscriber);
        tracing::debug!(target: TARGET, "Interaction subscriber registered");
        Ok(())
    }

    /// Clear the subscriber slot, whichever subscriber occupies it.
    pub fn unsubscribe<S: Subscriber + ?Sized>(&self, _subscriber: &Rc<S>) {
        if !self.inner.config.observer_enabled() {
            return;
        }
        if self.inner.subscriber.borrow_mut().take().is_some() {
            tracing::debug!(target: TARGET, "Interaction subscriber removed");
        }
    }

    pub(crate) fn subscriber(&self) -> Option<Rc<dyn Subscriber>> {
        self.inner.subscriber.borrow().clone()
    }

    /// A fresh thread id, starting at 1.
    pub fn next_thread_id(&self) -> ThreadId {
        self.inner.ids.next_thread_id()
    }

    pub(crate) fn next_interaction_id(&self) -> u64 {
        self.inner.ids.next_interaction_id()
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("config", &self.inner.config)
            .field("current", &*self.inner.current.borrow())
            .field("subscribed", &self.inner.subscriber.borrow().is_some())
            .finish()
    }
}

/// The calling thread's default tracker.
pub fn default_tracker() -> Tracker {
    DEFAULT_TRACKER.with(|tracker| tracker.borrow().clone())
}

/// Replace the calling thread's default tracker, returning the previous one.
///
/// Tests use this to get a fresh context with its own counters and subscriber.
pub fn set_default_tracker(tracker: Tracker) -> Tracker {
    DEFAULT_TRACKER.with(|slot| slot.replace(tracker))
}
