//! Minimal publish/subscribe bus for engine lifecycle notifications.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use crate::doc::Shape;

/// Event names understood by `on` / `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Load,
    Add,
    Delete,
    Select,
    Updated,
    Warn,
}

impl EventKind {
    /// Parse a host-facing event name (`"load"`, `"add"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "load" => Some(Self::Load),
            "add" => Some(Self::Add),
            "delete" => Some(Self::Delete),
            "select" => Some(Self::Select),
            "updated" => Some(Self::Updated),
            "warn" => Some(Self::Warn),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Select => "select",
            Self::Updated => "updated",
            Self::Warn => "warn",
        }
    }
}

/// A notification emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Background image finished loading; carries its source.
    Load(String),
    /// A shape was committed.
    Add(Shape),
    /// A shape was removed.
    Delete(Shape),
    /// Selection changed; `None` when the selection was cleared.
    Select(Option<Shape>),
    /// Dataset snapshot after a rendered frame.
    Updated(Vec<Shape>),
    /// Human-readable constraint or input warning.
    Warn(String),
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Load(_) => EventKind::Load,
            Self::Add(_) => EventKind::Add,
            Self::Delete(_) => EventKind::Delete,
            Self::Select(_) => EventKind::Select,
            Self::Updated(_) => EventKind::Updated,
            Self::Warn(_) => EventKind::Warn,
        }
    }
}

/// Handle returned by `EventBus::on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&Event)>;

/// Listeners keyed by event kind, invoked in registration order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &Event) {
        let kind = event.kind();
        for (_, k, listener) in &mut self.listeners {
            if *k == kind {
                listener(event);
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
