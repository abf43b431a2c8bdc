//! Interaction records, interaction sets and id generation.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Groups related scheduling notifications (a scheduler "lane").
///
/// Unrelated to OS threads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ThreadId(pub u64);

impl ThreadId {
    /// Used when the caller does not supply a thread.
    pub const DEFAULT: ThreadId = ThreadId(0);
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct InteractionInner {
    id: u64,
    name: String,
    timestamp: f64,
    pending_work: AtomicU32,
}

/// A named, timestamped cause for one or more units of work.
///
/// Cloning is cheap and yields a handle to the same interaction. Two handles are
/// equal only when they refer to the same interaction; ids alone can collide
/// across trackers.
#[derive(Clone)]
pub struct Interaction(Arc<InteractionInner>);

impl Interaction {
    pub(crate) fn new(id: u64, name: String, timestamp: f64) -> Self {
        Self(Arc::new(InteractionInner {
            id,
            name,
            timestamp,
            pending_work: AtomicU32::new(0),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Caller-supplied timestamp, in whatever unit the caller chose.
    pub fn timestamp(&self) -> f64 {
        self.0.timestamp
    }

    /// Outstanding units of scheduled work attributed to this interaction.
    pub fn pending_work_count(&self) -> u32 {
        self.0.pending_work.load(Ordering::Acquire)
    }

    pub(crate) fn set_pending_work(&self, count: u32) {
        self.0.pending_work.store(count, Ordering::Release);
    }

    pub(crate) fn increment_pending_work(&self) -> u32 {
        self.0.pending_work.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the count after decrementing, or `None` if it was already zero.
    pub(crate) fn decrement_pending_work(&self) -> Option<u32> {
        self.0
            .pending_work
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .ok()
            .map(|previous| previous - 1)
    }
}

impl PartialEq for Interaction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Interaction {}

impl Hash for Interaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("timestamp", &self.0.timestamp)
            .field("pending_work", &self.pending_work_count())
            .finish()
    }
}

/// An immutable set of interactions, shared by reference.
///
/// Cloning shares the same underlying set; [`InteractionSet::ptr_eq`] tells two
/// handles to one set apart from two equal sets.
#[derive(Clone, Default)]
pub struct InteractionSet(Arc<BTreeMap<u64, Interaction>>);

impl InteractionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new set holding everything in `self` plus `interaction`.
    pub(crate) fn with(&self, interaction: Interaction) -> Self {
        let mut interactions = (*self.0).clone();
        interactions.insert(interaction.id(), interaction);
        Self(Arc::new(interactions))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, interaction: &Interaction) -> bool {
        self.0
            .get(&interaction.id())
            .is_some_and(|member| Arc::ptr_eq(&member.0, &interaction.0))
    }

    /// Interactions in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.0.values()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.0.keys().copied().collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(Interaction::name).collect()
    }

    /// Whether both handles point at the very same set.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

/// Same members, by identity.
impl PartialEq for InteractionSet {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.0.values().eq(other.0.values())
    }
}

impl Eq for InteractionSet {}

impl fmt::Debug for InteractionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.values()).finish()
    }
}

impl FromIterator<Interaction> for InteractionSet {
    fn from_iter<I: IntoIterator<Item = Interaction>>(iter: I) -> Self {
        Self(Arc::new(
            iter.into_iter()
                .map(|interaction| (interaction.id(), interaction))
                .collect(),
        ))
    }
}

impl<'a> IntoIterator for &'a InteractionSet {
    type Item = &'a Interaction;
    type IntoIter = std::collections::btree_map::Values<'a, u64, Interaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}

/// Counters backing interaction and thread ids for one tracker.
#[derive(Debug, Default)]
pub(crate) struct IdCounters {
    interaction: AtomicU64,
    thread: AtomicU64,
}

impl IdCounters {
    /// First id handed out is 0.
    pub(crate) fn next_interaction_id(&self) -> u64 {
        self.interaction.fetch_add(1, Ordering::Relaxed)
    }

    /// First id handed out is 1; 0 is reserved for [`ThreadId::DEFAULT`].
    pub(crate) fn next_thread_id(&self) -> ThreadId {
        ThreadId(self.thread.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
