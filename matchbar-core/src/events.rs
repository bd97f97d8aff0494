//! Host events and an explicit subscribe/unsubscribe registry.

use std::path::PathBuf;

use crate::config::NAMESPACE;

/// Notifications a host delivers to the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Activated,
    /// Settings changed; `sections` lists the affected keys or namespaces.
    ConfigurationChanged { sections: Vec<String> },
    DocumentSaved { path: PathBuf },
    Deactivated,
}

/// Discriminant used when subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Activated,
    ConfigurationChanged,
    DocumentSaved,
    Deactivated,
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Activated => EventKind::Activated,
            Self::ConfigurationChanged { .. } => EventKind::ConfigurationChanged,
            Self::DocumentSaved { .. } => EventKind::DocumentSaved,
            Self::Deactivated => EventKind::Deactivated,
        }
    }

    /// Whether a configuration change touches the `matchbar` namespace.
    pub fn affects_namespace(&self) -> bool {
        match self {
            Self::ConfigurationChanged { sections } => sections.iter().any(|s| {
                s == NAMESPACE
                    || s.strip_prefix(NAMESPACE)
                        .is_some_and(|rest| rest.starts_with('.'))
            }),
            _ => false,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Handler<C> = Box<dyn FnMut(&mut C, &HostEvent) + Send>;

/// Routes host events to the handlers registered for their kind.
pub struct EventBus<C> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, EventKind, Handler<C>)>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: Handler<C>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, kind, handler));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _, _)| *sid != id);
        self.handlers.len() != before
    }

    /// Run every handler subscribed to the event's kind, in registration
    /// order. Returns how many ran.
    pub fn dispatch(&mut self, ctx: &mut C, event: &HostEvent) -> usize {
        let kind = event.kind();
        let mut ran = 0;
        for (_, k, handler) in self.handlers.iter_mut() {
            if *k == kind {
                handler(ctx, event);
                ran += 1;
            }
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
