//! Event bridge: single-subscriber delivery of inbound envelopes to the application.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::protocol::Envelope;

/// Application-side receiver of inbound envelopes.
pub trait EventSink: Send + Sync {
    fn on_event(&self, envelope: Envelope);
}

impl<F> EventSink for F
where
    F: Fn(Envelope) + Send + Sync,
{
    fn on_event(&self, envelope: Envelope) {
        self(envelope)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscribeError {
    #[error("an event sink is already active")]
    AlreadySubscribed,
}

#[derive(Default)]
pub struct EventBridge {
    sink: Mutex<Option<Arc<dyn EventSink>>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `sink`. Rejected while another sink is active; the active one stays.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> Result<(), SubscribeError> {
        let mut guard = match self.sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            warn!("event sink already active, ignoring additional subscriber");
            return Err(SubscribeError::AlreadySubscribed);
        }
        *guard = Some(sink);
        debug!("event sink subscribed");
        Ok(())
    }

    /// Clear the active sink. No-op when none is active. A `publish` that copied the sink
    /// before this call may still deliver that one event after it returns.
    pub fn unsubscribe(&self) {
        let mut guard = match self.sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.take().is_some() {
            debug!("event sink cancelled");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Deliver to the active sink. Returns false when there is none and the envelope is dropped.
    pub fn publish(&self, envelope: Envelope) -> bool {
        // The sink is called outside the lock so it may unsubscribe from inside `on_event`.
        let sink = self.sink.lock().ok().and_then(|g| g.clone());
        match sink {
            Some(sink) => {
                sink.on_event(envelope);
                true
            }
            None => {
                debug!("no event sink, dropping inbound message");
                false
            }
        }
    }
}
