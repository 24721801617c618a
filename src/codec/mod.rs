//! Codec Module
//!
//! The stateful, bidirectional protocol handler for one connection:
//! requests go out as wire frames and join the in-flight FIFO; responses
//! come back, are correlated by opaque against the FIFO head, and leave as
//! typed results. The codec is strictly single-threaded per connection;
//! nothing in here locks.
//!
//! Endpoint state the codec needs (remote hostname, client environment) is
//! passed in as an explicit [`ConnContext`] instead of being stored, so
//! the codec never holds a back-reference to its owner.

mod decoder;
mod encoder;
mod inflight;
mod stats;

pub use inflight::InFlightQueue;

use crate::config::Environment;
use crate::error::{CoralError, Result};
use crate::features::{ServerFeature, ServerFeatures};
use crate::protocol::{KvRequest, KvResponse, RequestFrame, ResponseFrame, ResponseStatus};
use stats::StatStream;

/// Per-call view of the endpoint owning the connection
#[derive(Debug, Clone, Copy)]
pub struct ConnContext<'a> {
    /// Client environment (feature toggles, wire limits)
    pub env: &'a Environment,

    /// Hostname of the remote data node
    pub remote_hostname: &'a str,
}

/// Outcome of feeding one response frame into the codec
#[derive(Debug)]
pub enum DecodeOutcome {
    /// A typed response was produced and its request dequeued
    ///
    /// The request travels back to the caller: on a retry status it still
    /// owns its payload buffer and can be re-encoded verbatim; on any
    /// other status the payload has been released.
    Response {
        response: KvResponse,
        request: KvRequest,
    },

    /// A STAT stream is still accumulating; the request stays in flight
    StatPending,
}

/// Protocol codec for a single connection
#[derive(Debug, Default)]
pub struct KvCodec {
    /// Requests awaiting responses, in send order
    inflight: InFlightQueue,

    /// Live STAT stream accumulation
    stats: StatStream,

    /// Whether mutation responses carry sequence-number tokens in extras
    seq_on_mutation: bool,
}

impl KvCodec {
    pub fn new() -> Self {
        KvCodec::default()
    }

    /// Encode a request into a wire frame and register it in flight
    ///
    /// For payload-carrying requests (stores, append/prepend, sub-document
    /// operations) one payload handle is retained here and held until the
    /// entry leaves the queue, so a NOT_MY_VBUCKET style retry can
    /// re-encode the identical bytes. Observe bodies are codec-owned and
    /// never retained.
    pub fn encode(&mut self, request: KvRequest) -> Result<RequestFrame> {
        let frame = encoder::encode_request(&request)?;

        let retained = if request.kind().carries_payload() {
            request.payload().map(|p| p.retain())
        } else {
            None
        };
        self.inflight.push(request, retained);

        Ok(frame)
    }

    /// Decode one fully-framed response against the in-flight head
    ///
    /// Fatal protocol-integrity errors (opaque mismatch, truncated bodies,
    /// unknown formats) are returned as errors; the owning endpoint must
    /// then tear the connection down via [`KvCodec::close`].
    pub fn decode(&mut self, cx: &ConnContext<'_>, frame: &ResponseFrame) -> Result<DecodeOutcome> {
        let head = self
            .inflight
            .head_mut()
            .ok_or(CoralError::NoRequestInFlight(frame.opaque))?;

        let expected = head.request().opaque();
        if expected != frame.opaque {
            return Err(CoralError::OpaqueMismatch {
                expected,
                actual: frame.opaque,
            });
        }

        let status = ResponseStatus::from_wire(frame.status);

        // Terminal statuses release the retained caller payload; a retry
        // keeps it so the request can be re-encoded.
        if !status.should_retry() {
            if let Some(payload) = head.request_mut().take_payload() {
                payload.release();
            }
        }

        let request_ref = self.inflight.head().map(|e| e.request());
        let request_ref = match request_ref {
            Some(r) => r,
            // head_mut above guarantees the entry exists
            None => return Err(CoralError::NoRequestInFlight(frame.opaque)),
        };

        let body = decoder::decode_body(
            request_ref,
            frame,
            status,
            self.seq_on_mutation,
            cx.remote_hostname,
            &mut self.stats,
        )?;

        match body {
            Some(body) => {
                let entry = match self.inflight.finish_head() {
                    Some(entry) => entry,
                    None => return Err(CoralError::NoRequestInFlight(frame.opaque)),
                };
                let request = entry.into_request();
                let response =
                    KvResponse::new(status, frame.status, request.bucket(), body);
                Ok(DecodeOutcome::Response { response, request })
            }
            None => Ok(DecodeOutcome::StatPending),
        }
    }

    /// Handle the out-of-band server-features event
    ///
    /// Mutation-token decoding activates only when both the environment
    /// enables tokens and the server advertised MUTATION_SEQNO.
    pub fn on_server_features(&mut self, cx: &ConnContext<'_>, features: &ServerFeatures) {
        self.seq_on_mutation =
            cx.env.mutation_tokens_enabled && features.contains(ServerFeature::MutationSeqno);
        tracing::debug!(
            host = cx.remote_hostname,
            seq_on_mutation = self.seq_on_mutation,
            "Server features negotiated"
        );
    }

    /// Whether mutation responses are currently decoded with tokens
    pub fn seq_on_mutation(&self) -> bool {
        self.seq_on_mutation
    }

    /// Cancel one pending request; its payload buffer is released once
    pub fn cancel(&mut self, opaque: u32) -> bool {
        let cancelled = self.inflight.cancel(opaque);
        if cancelled {
            tracing::debug!(opaque, "Cancelled in-flight request");
        }
        cancelled
    }

    /// Tear down the connection state, cancelling everything in flight
    ///
    /// Every remaining entry's payload buffers are released exactly once.
    /// Returns the number of requests that were still pending.
    pub fn close(&mut self) -> usize {
        let dropped = self.inflight.cancel_all();
        self.stats = StatStream::default();
        if dropped > 0 {
            tracing::debug!(dropped, "Connection closed with requests in flight");
        }
        dropped
    }

    /// Number of requests currently awaiting responses
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}
