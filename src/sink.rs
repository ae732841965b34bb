//! Observability sink injected into the core components.
//!
//! The core never touches a global logger. Components hold an
//! `Arc<dyn EventSink>`; the binary wires in [`TracingSink`], library users
//! get [`NoopSink`] unless they pass their own.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

pub trait EventSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn debug(&self, message: &str);
}

pub type SharedSink = Arc<dyn EventSink>;

pub fn noop() -> SharedSink {
    Arc::new(NoopSink)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
}

/// Forwards events to `tracing` under a fixed target.
#[derive(Debug, Clone)]
pub struct TracingSink {
    component: &'static str,
}

impl TracingSink {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn shared(component: &'static str) -> SharedSink {
        Arc::new(Self::new(component))
    }
}

impl EventSink for TracingSink {
    fn info(&self, message: &str) {
        info!(component = self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        warn!(component = self.component, "{}", message);
    }

    fn debug(&self, message: &str) {
        debug!(component = self.component, "{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Debug,
}

/// Keeps every event in memory so callers can assert on degradation paths.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(EventLevel, String)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(EventLevel, String)> {
        match self.events.lock() {
            Ok(ev) => ev.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, level: EventLevel) -> usize {
        self.events().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, level: EventLevel, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: EventLevel, message: &str) {
        let mut ev = match self.events.lock() {
            Ok(ev) => ev,
            Err(poisoned) => poisoned.into_inner(),
        };
        ev.push((level, message.to_string()));
    }
}

impl EventSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(EventLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(EventLevel::Warn, message);
    }

    fn debug(&self, message: &str) {
        self.push(EventLevel::Debug, message);
    }
}
