//! Downstream response publication
//!
//! Decoded responses leave the codec through a [`ResponseSink`]. Publishing
//! must never block the connection's event loop, so the provided
//! channel-backed sink drops (and logs) when the consumer falls behind
//! rather than stalling the reader.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

use crate::protocol::KvResponse;

/// Consumer of decoded responses
pub trait ResponseSink {
    /// Publish one response; must not block
    fn publish(&self, response: KvResponse);
}

/// Channel-backed sink for tests and simple drivers
pub struct ChannelSink {
    sender: Sender<KvResponse>,
}

impl ChannelSink {
    /// Create a sink with a bounded queue; returns the consuming end too
    pub fn new(capacity: usize) -> (ChannelSink, Receiver<KvResponse>) {
        let (sender, receiver) = bounded(capacity);
        (ChannelSink { sender }, receiver)
    }
}

impl ResponseSink for ChannelSink {
    fn publish(&self, response: KvResponse) {
        match self.sender.try_send(response) {
            Ok(()) => {}
            Err(TrySendError::Full(response)) => {
                tracing::warn!(
                    bucket = response.bucket(),
                    "Response dropped: sink at capacity"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Response dropped: sink disconnected");
            }
        }
    }
}
