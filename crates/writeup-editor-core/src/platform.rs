//! Host abstraction traits for editor operations.
//!
//! These traits define the interface between the editor logic and whatever
//! hosts it (a browser page, a native window, a test harness).

use std::sync::Mutex;

use crate::types::Position;

/// Blocking, user-visible message (an alert dialog in a browser).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Maps pointer coordinates onto a document position.
///
/// Returns `None` when the point is outside the editor content.
pub trait PositionResolver: Send + Sync {
    fn resolve(&self, x: f64, y: f64) -> Option<Position>;
}

/// Notifier that keeps every message, for hosts that show them later.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(message, "user notification");
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_owned());
        }
    }
}

/// Resolver for hosts without layout: every drop lands at one position.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPosition(pub Option<Position>);

impl PositionResolver for FixedPosition {
    fn resolve(&self, _x: f64, _y: f64) -> Option<Position> {
        self.0
    }
}
