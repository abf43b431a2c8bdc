//! Scoped installation of an ambient interaction set.

use crate::interaction::InteractionSet;
use crate::registry::Tracker;

/// Restores the previous ambient set when dropped, on unwind included.
#[must_use = "the previous interactions are restored as soon as the guard is dropped"]
pub(crate) struct ScopeGuard<'a> {
    tracker: &'a Tracker,
    previous: Option<InteractionSet>,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.tracker.set_current(previous);
        }
    }
}

impl Tracker {
    /// Install `interactions` as the ambient set until the guard drops.
    pub(crate) fn enter(&self, interactions: InteractionSet) -> ScopeGuard<'_> {
        let previous = self.set_current(interactions);
        ScopeGuard {
            tracker: self,
            previous: Some(previous),
        }
    }

    /// Run `callback` with no interactions visible.
    ///
    /// Work scheduled inside `callback` is not attributed to whatever interactions
    /// are active around it. The previous set is back in place once this returns
    /// or unwinds. No subscriber notifications are fired.
    pub fn clear<F, R>(&self, callback: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.config().enabled {
            return callback();
        }

        let _scope = self.enter(InteractionSet::new());
        callback()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use crate::config::TrackingConfig;
    use crate::registry::Tracker;
    use crate::subscriber::NotificationKind;
    use crate::test_support::Recorder;

    #[test]
    fn test_clear_hides_interactions() {
        let tracker = Tracker::new(TrackingConfig::default());
        let recorder = Recorder::new();
        tracker.subscribe(recorder.clone()).unwrap();

        tracker
            .track("outer", 0.0, || {
                let before = tracker.get_current().unwrap();
                assert_eq!(before.names(), vec!["outer"]);

                let inside = tracker.clear(|| tracker.get_current().unwrap());
                assert!(inside.is_empty());

                let after = tracker.get_current().unwrap();
                assert!(crate::InteractionSet::ptr_eq(&before, &after));
            })
            .unwrap();

        // Only the outer track notified anything
        assert_eq!(
            recorder.kinds(),
            vec![
                NotificationKind::InteractionTracked,
                NotificationKind::WorkStarted,
                NotificationKind::WorkStopped,
                NotificationKind::InteractionScheduledWorkCompleted,
            ]
        );
    }

    #[test]
    fn test_clear_restores_on_panic() {
        let tracker = Tracker::new(TrackingConfig::default());

        tracker
            .track("outer", 0.0, || {
                let before = tracker.get_current().unwrap();
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    tracker.clear::<_, ()>(|| panic!("inside clear"));
                }));
                assert!(result.is_err());
                assert!(crate::InteractionSet::ptr_eq(
                    &before,
                    &tracker.get_current().unwrap()
                ));
            })
            .unwrap();
    }

    #[test]
    fn test_clear_disabled_passes_through() {
        let tracker = Tracker::disabled();
        assert_eq!(tracker.clear(|| 7), 7);
        assert_eq!(tracker.get_current(), None);
    }
}
