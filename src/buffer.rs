//! Reference-counted payload buffers
//!
//! Caller-supplied document bodies cross into the codec at encode time and
//! must stay alive until the server has answered: a NOT_MY_VBUCKET style
//! retry means the exact same bytes get re-encoded. `Payload` is a move-only
//! handle over a shared byte buffer with an explicit `retain` operation and
//! an observable handle count, so tests can assert that every code path
//! (success, retry, failure, cancellation, teardown) leaves the accounting
//! balanced.
//!
//! Dropping a handle releases it; Rust ownership makes a double-release
//! unrepresentable. `release` exists as the explicit spelling of that drop
//! at the points where the protocol contract demands one.

use std::sync::Arc;

use bytes::Bytes;

/// A move-only handle to a shared, immutable payload buffer
#[derive(Debug)]
pub struct Payload {
    /// The shared bytes; cloning `Bytes` is a cheap refcount bump
    data: Bytes,

    /// Handle tracker; one `Arc` clone per outstanding `Payload` handle
    live: Arc<()>,
}

impl Payload {
    /// Wrap a byte buffer into a fresh payload with a single handle
    pub fn new(data: impl Into<Bytes>) -> Self {
        Payload {
            data: data.into(),
            live: Arc::new(()),
        }
    }

    /// Acquire an additional handle to the same buffer
    pub fn retain(&self) -> Payload {
        Payload {
            data: self.data.clone(),
            live: Arc::clone(&self.live),
        }
    }

    /// Explicitly release this handle
    pub fn release(self) {
        drop(self);
    }

    /// Number of live handles to this buffer (including this one)
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.live)
    }

    /// View the payload bytes
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    /// Length of the payload in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A probe that watches a payload's handle count without holding a handle
///
/// Used by lifecycle tests to observe the count after every handle has been
/// consumed.
#[derive(Debug, Clone)]
pub struct PayloadProbe {
    live: std::sync::Weak<()>,
}

impl Payload {
    /// Create a probe for this payload's handles
    pub fn probe(&self) -> PayloadProbe {
        PayloadProbe {
            live: Arc::downgrade(&self.live),
        }
    }
}

impl PayloadProbe {
    /// Current number of live handles (0 once all have been released)
    pub fn handle_count(&self) -> usize {
        self.live.strong_count()
    }
}
