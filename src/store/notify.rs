//! Change notification keyed by dotted data paths

use std::fmt;

/// A change that happened at `path`, e.g. `elements.stateMachines.G.states`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: String,
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&ChangeEvent)>;

struct Subscription {
    id: SubscriptionId,
    path: String,
    listener: Listener,
}

/// Listeners registered against dotted paths.
///
/// A listener hears an event when its path equals the event path or either
/// one is a prefix of the other at a `.` boundary: `elements` hears every
/// element change, `elements.stateMachines.G.states.S1` hears a change of
/// `elements.stateMachines.G.states`.
#[derive(Default)]
pub struct ChangeBus {
    next_id: SubscriptionId,
    subscriptions: Vec<Subscription>,
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, path: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id: self.next_id,
            path: path.into(),
            listener: Box::new(listener),
        });
        self.next_id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn emit(&mut self, path: &str) {
        let event = ChangeEvent {
            path: path.to_string(),
        };
        log::trace!("change: {}", path);
        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|s| paths_overlap(&s.path, path))
        {
            (sub.listener)(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

/// Whether two dotted paths name the same value or one contains the other
pub fn paths_overlap(a: &str, b: &str) -> bool {
    fn is_prefix(prefix: &str, path: &str) -> bool {
        prefix.is_empty()
            || path == prefix
            || (path.starts_with(prefix) && path[prefix.len()..].starts_with('.'))
    }
    is_prefix(a, b) || is_prefix(b, a)
}
