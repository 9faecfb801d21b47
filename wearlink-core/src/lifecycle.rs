//! Listener lifecycle: transport listener registration and application attachment are
//! tracked separately. Attachment flips on every attach/detach; registration happens once
//! and ends only on teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Transport listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unregistered,
    Registered,
}

/// Result of an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Caller must register the transport listener now.
    Register,
    /// Listener already registered; nothing to do.
    AlreadyRegistered,
}

pub struct ListenerLifecycle {
    listener: Mutex<ListenerState>,
    attached: AtomicBool,
}

impl Default for ListenerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerLifecycle {
    pub fn new() -> Self {
        Self {
            listener: Mutex::new(ListenerState::Unregistered),
            attached: AtomicBool::new(false),
        }
    }

    pub fn listener_state(&self) -> ListenerState {
        *self.lock()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Hosting context attached. Marks the application attached and reports whether the
    /// listener still has to be registered. The state moves to `Registered` here, so a
    /// concurrent second activation sees `AlreadyRegistered`.
    pub fn activate(&self) -> Activation {
        self.attached.store(true, Ordering::Release);
        let mut state = self.lock();
        match *state {
            ListenerState::Unregistered => {
                *state = ListenerState::Registered;
                Activation::Register
            }
            ListenerState::Registered => Activation::AlreadyRegistered,
        }
    }

    /// Registration failed after `activate` returned `Register`. Nothing is attached and the
    /// next activation retries.
    pub fn registration_failed(&self) {
        self.attached.store(false, Ordering::Release);
        *self.lock() = ListenerState::Unregistered;
    }

    /// Hosting context detached. The listener stays registered.
    pub fn deactivate(&self) {
        self.attached.store(false, Ordering::Release);
    }

    /// Permanent teardown. Returns true if a listener was registered and must be removed.
    pub fn teardown(&self) -> bool {
        self.attached.store(false, Ordering::Release);
        let mut state = self.lock();
        let was_registered = *state == ListenerState::Registered;
        *state = ListenerState::Unregistered;
        was_registered
    }

    /// Listener removal failed after `teardown` returned true. The transport still holds the
    /// listener, so the state goes back to `Registered`.
    pub fn teardown_failed(&self) {
        *self.lock() = ListenerState::Registered;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListenerState> {
        match self.listener.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
