//! Shared helpers for the interaction-tracking integration tests.

// Each test file compiles separately, so not all helpers are used in each binary
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use interaction_tracking::{
    Interaction, InteractionSet, NotificationKind, Subscriber, SubscriberError, ThreadId,
    Tracker, TrackingConfig, set_default_tracker,
};

/// One recorded notification: which method fired, for which interaction names.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub kind: NotificationKind,
    pub names: Vec<String>,
    pub thread_id: Option<ThreadId>,
}

/// Subscriber that remembers every notification it receives.
#[derive(Default)]
pub struct Recorder {
    notes: RefCell<Vec<Note>>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notes.borrow().iter().map(|note| note.kind).collect()
    }

    /// Names passed to every `on_interaction_scheduled_work_completed`.
    pub fn completed(&self) -> Vec<String> {
        self.notes
            .borrow()
            .iter()
            .filter(|note| note.kind == NotificationKind::InteractionScheduledWorkCompleted)
            .flat_map(|note| note.names.clone())
            .collect()
    }

    fn push_one(&self, kind: NotificationKind, interaction: &Interaction) {
        self.notes.borrow_mut().push(Note {
            kind,
            names: vec![interaction.name().to_string()],
            thread_id: None,
        });
    }

    fn push_set(&self, kind: NotificationKind, interactions: &InteractionSet, thread_id: ThreadId) {
        self.notes.borrow_mut().push(Note {
            kind,
            names: interactions
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            thread_id: Some(thread_id),
        });
    }
}

impl Subscriber for Recorder {
    fn on_interaction_tracked(&self, interaction: &Interaction) -> Result<(), SubscriberError> {
        self.push_one(NotificationKind::InteractionTracked, interaction);
        Ok(())
    }

    fn on_interaction_scheduled_work_completed(
        &self,
        interaction: &Interaction,
    ) -> Result<(), SubscriberError> {
        self.push_one(NotificationKind::InteractionScheduledWorkCompleted, interaction);
        Ok(())
    }

    fn on_work_scheduled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.push_set(NotificationKind::WorkScheduled, interactions, thread_id);
        Ok(())
    }

    fn on_work_canceled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.push_set(NotificationKind::WorkCanceled, interactions, thread_id);
        Ok(())
    }

    fn on_work_started(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.push_set(NotificationKind::WorkStarted, interactions, thread_id);
        Ok(())
    }

    fn on_work_stopped(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.push_set(NotificationKind::WorkStopped, interactions, thread_id);
        Ok(())
    }
}

/// Install a fresh default tracker with a recorder subscribed to it.
///
/// Test threads are not reused across tests, but the default is reset anyway so
/// every test starts from id 0.
pub fn fresh_default() -> (Tracker, Rc<Recorder>) {
    let tracker = Tracker::new(TrackingConfig::default());
    let recorder = Recorder::new();
    tracker
        .subscribe(recorder.clone())
        .expect("Failed to subscribe recorder");
    set_default_tracker(tracker.clone());
    (tracker, recorder)
}

/// Sorted names of the default tracker's ambient interactions.
pub fn current_names() -> Vec<String> {
    let mut names: Vec<String> = interaction_tracking::get_current()
        .expect("tracking is enabled")
        .names()
        .into_iter()
        .map(str::to_string)
        .collect();
    names.sort();
    names
}
