//! In-flight request correlation
//!
//! A connection-local FIFO of requests awaiting their responses. The head
//! always carries the opaque of the next expected response; responses
//! arrive strictly in send order, so anything else is a broken connection.
//!
//! Entries own the codec's retained payload handle. Dropping an entry
//! (dequeue, cancellation, teardown) releases that handle; the request's
//! own handle survives only as long as the request does.

use std::collections::VecDeque;

use crate::buffer::Payload;
use crate::protocol::KvRequest;

/// A request waiting for its response
#[derive(Debug)]
pub struct InFlightEntry {
    /// The originating request; the decoder dispatches on its variant
    request: KvRequest,

    /// Payload handle retained at encode so a retry can re-encode
    retained: Option<Payload>,
}

impl InFlightEntry {
    /// Consume the entry, releasing the retained handle
    pub fn into_request(self) -> KvRequest {
        // retained drops here
        self.request
    }

    pub fn request(&self) -> &KvRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut KvRequest {
        &mut self.request
    }
}

/// FIFO of in-flight requests, implicitly keyed by opaque
#[derive(Debug, Default)]
pub struct InFlightQueue {
    entries: VecDeque<InFlightEntry>,
}

impl InFlightQueue {
    pub fn new() -> Self {
        InFlightQueue {
            entries: VecDeque::new(),
        }
    }

    /// Enqueue a freshly-encoded request with its retained payload handle
    pub fn push(&mut self, request: KvRequest, retained: Option<Payload>) {
        self.entries.push_back(InFlightEntry { request, retained });
    }

    /// Peek the request the next response must answer
    pub fn head(&self) -> Option<&InFlightEntry> {
        self.entries.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut InFlightEntry> {
        self.entries.front_mut()
    }

    /// Dequeue the head once its decoding has finished
    pub fn finish_head(&mut self) -> Option<InFlightEntry> {
        self.entries.pop_front()
    }

    /// Cancel a pending request by opaque, wherever it sits in the queue
    ///
    /// Returns whether an entry was removed. The removed entry's payload
    /// handles are released exactly once, by dropping.
    pub fn cancel(&mut self, opaque: u32) -> bool {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.request.opaque() == opaque)
        {
            let entry = self.entries.remove(pos);
            drop(entry);
            true
        } else {
            false
        }
    }

    /// Drop every pending entry (connection teardown); returns the count
    pub fn cancel_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
