//! Recording subscriber shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::SubscriberError;
use crate::interaction::{Interaction, InteractionSet, ThreadId};
use crate::subscriber::{NotificationKind, Subscriber};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub kind: NotificationKind,
    pub ids: Vec<u64>,
    /// Pending work per interaction at notification time.
    pub pending: Vec<u32>,
    pub thread_id: Option<ThreadId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FailMode {
    Error,
    Panic,
}

#[derive(Default)]
pub(crate) struct Recorder {
    entries: RefCell<Vec<Entry>>,
    fail_on: Cell<Option<(NotificationKind, FailMode)>>,
}

impl Recorder {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn fail_on(&self, kind: NotificationKind, mode: FailMode) {
        self.fail_on.set(Some((kind, mode)));
    }

    pub(crate) fn entries(&self) -> Vec<Entry> {
        self.entries.borrow().clone()
    }

    pub(crate) fn kinds(&self) -> Vec<NotificationKind> {
        self.entries.borrow().iter().map(|entry| entry.kind).collect()
    }

    pub(crate) fn count(&self, kind: NotificationKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    pub(crate) fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn record<'a>(
        &self,
        kind: NotificationKind,
        interactions: impl Iterator<Item = &'a Interaction>,
        thread_id: Option<ThreadId>,
    ) -> Result<(), SubscriberError> {
        let (ids, pending): (Vec<u64>, Vec<u32>) = interactions
            .map(|interaction| (interaction.id(), interaction.pending_work_count()))
            .unzip();
        self.entries.borrow_mut().push(Entry {
            kind,
            ids,
            pending,
            thread_id,
        });

        match self.fail_on.get() {
            Some((fail_kind, FailMode::Error)) if fail_kind == kind => {
                Err(SubscriberError::failed(kind, "recorder failure"))
            }
            Some((fail_kind, FailMode::Panic)) if fail_kind == kind => {
                panic!("recorder panic in {kind}")
            }
            _ => Ok(()),
        }
    }
}

impl Subscriber for Recorder {
    fn on_interaction_tracked(&self, interaction: &Interaction) -> Result<(), SubscriberError> {
        self.record(
            NotificationKind::InteractionTracked,
            std::iter::once(interaction),
            None,
        )
    }

    fn on_interaction_scheduled_work_completed(
        &self,
        interaction: &Interaction,
    ) -> Result<(), SubscriberError> {
        self.record(
            NotificationKind::InteractionScheduledWorkCompleted,
            std::iter::once(interaction),
            None,
        )
    }

    fn on_work_scheduled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.record(
            NotificationKind::WorkScheduled,
            interactions.iter(),
            Some(thread_id),
        )
    }

    fn on_work_canceled(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.record(
            NotificationKind::WorkCanceled,
            interactions.iter(),
            Some(thread_id),
        )
    }

    fn on_work_started(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.record(
            NotificationKind::WorkStarted,
            interactions.iter(),
            Some(thread_id),
        )
    }

    fn on_work_stopped(
        &self,
        interactions: &InteractionSet,
        thread_id: ThreadId,
    ) -> Result<(), SubscriberError> {
        self.record(
            NotificationKind::WorkStopped,
            interactions.iter(),
            Some(thread_id),
        )
    }
}

/// Messages of the `warn` events this crate emits while `f` runs.
pub(crate) fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    #[derive(Clone, Default)]
    struct Warnings(Arc<Mutex<Vec<String>>>);

    struct Message<'a>(&'a mut Option<String>);

    impl Visit for Message<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = Some(format!("{value:?}"));
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Warnings {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let metadata = event.metadata();
            if *metadata.level() != tracing::Level::WARN || metadata.target() != crate::TARGET {
                return;
            }
            let mut message = None;
            event.record(&mut Message(&mut message));
            if let Some(message) = message {
                self.0.lock().unwrap().push(message);
            }
        }
    }

    let warnings = Warnings::default();
    let dispatch = tracing_subscriber::registry().with(warnings.clone());
    let value = tracing::subscriber::with_default(dispatch, f);
    let messages = warnings.0.lock().unwrap().clone();
    (value, messages)
}
