//! Response definitions
//!
//! Typed responses produced by the decoder. Every response carries the
//! semantic status, the raw server status code and the bucket it belongs
//! to; variant-specific data (CAS, values, tokens, per-path results) lives
//! in the body.

use bytes::Bytes;
use serde::Serialize;

use crate::protocol::opcode::SubdocOp;
use crate::protocol::status::ResponseStatus;

/// Identifies a specific mutation for durability queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationToken {
    /// Partition (vBucket) the mutation landed on
    pub partition: u64,

    /// UUID of the partition's current history branch
    pub vbucket_uuid: u64,

    /// Sequence number of the mutation on that partition
    pub sequence: u64,

    /// Bucket the mutation belongs to
    pub bucket: String,
}

/// Replication/persistence state of a document as reported by observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveStatus {
    FoundNotPersisted,
    FoundPersisted,
    NotFoundNotPersisted,
    NotFoundPersisted,
    /// Any byte outside the catalogue; the raw value is preserved
    Unknown(u8),
}

impl ObserveStatus {
    pub fn from_byte(byte: u8) -> ObserveStatus {
        match byte {
            0x00 => ObserveStatus::FoundNotPersisted,
            0x01 => ObserveStatus::FoundPersisted,
            0x80 => ObserveStatus::NotFoundNotPersisted,
            0x81 => ObserveStatus::NotFoundPersisted,
            other => ObserveStatus::Unknown(other),
        }
    }
}

/// Sequence-number snapshot for a partition, from observe-seqno
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveSeqnoResult {
    /// Format 0: the partition has not failed over
    NoFailover {
        partition: u16,
        vbucket_uuid: u64,
        last_persisted: u64,
        current_seqno: u64,
    },

    /// Format 1: the partition failed over since the vbucket UUID was taken
    Failover {
        partition: u16,
        vbucket_uuid: u64,
        last_persisted: u64,
        current_seqno: u64,
        old_vbucket_uuid: u64,
        last_received: u64,
    },
}

/// One key/value pair from a statistics stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatEntry {
    pub key: String,
    pub value: String,
}

/// Per-path result of a multi sub-document operation
#[derive(Debug, Clone)]
pub struct SubdocResult {
    /// The operation the result answers
    pub op: SubdocOp,

    /// The path the operation targeted
    pub path: String,

    /// Semantic status of this individual path
    pub status: ResponseStatus,

    /// Raw server status code of this individual path
    pub server_code: u16,

    /// Result fragment; empty when the operation produced no value
    pub value: Bytes,
}

/// A typed response emitted to the response pipeline
#[derive(Debug)]
pub struct KvResponse {
    status: ResponseStatus,
    server_code: u16,
    bucket: String,
    body: ResponseBody,
}

/// Variant-specific response data
#[derive(Debug)]
pub enum ResponseBody {
    /// Document fetch (get, get-and-lock, get-and-touch, replica get)
    Get { cas: u64, flags: u32, value: Bytes },

    /// Raw bucket configuration document, annotated with its origin host
    BucketConfig { config: Bytes, hostname: String },

    /// Insert/upsert/replace acknowledgement
    Store {
        cas: u64,
        mutation_token: Option<MutationToken>,
    },

    /// Remove acknowledgement
    Remove {
        cas: u64,
        mutation_token: Option<MutationToken>,
    },

    /// Counter result; 0 when the operation failed
    Counter {
        cas: u64,
        value: u64,
        mutation_token: Option<MutationToken>,
    },

    /// Unlock acknowledgement
    Unlock,

    /// Touch acknowledgement
    Touch,

    /// Append acknowledgement
    Append {
        cas: u64,
        mutation_token: Option<MutationToken>,
    },

    /// Prepend acknowledgement
    Prepend {
        cas: u64,
        mutation_token: Option<MutationToken>,
    },

    /// Keep-alive acknowledgement (NOOP reply)
    KeepAlive,

    /// Finalized statistics stream, one entry per non-terminal response
    Stats { entries: Vec<StatEntry> },

    /// Mutation-token telemetry snapshot
    MutationTokens { tokens: Vec<MutationToken> },

    /// Observe result for a single document
    Observe {
        master: bool,
        observed: ObserveStatus,
        observed_cas: u64,
    },

    /// Observe-seqno result for a partition
    ObserveSeqno {
        master: bool,
        result: Option<ObserveSeqnoResult>,
    },

    /// Single-path sub-document result
    SubdocSingle {
        cas: u64,
        value: Bytes,
        mutation_token: Option<MutationToken>,
    },

    /// Multi-path sub-document lookup results, one per command
    SubdocMultiLookup { results: Vec<SubdocResult> },

    /// Multi-path sub-document mutation results
    SubdocMultiMutation {
        cas: u64,
        mutation_token: Option<MutationToken>,
        /// One result per command on success; empty otherwise
        results: Vec<SubdocResult>,
        /// On partial failure: (index, raw status) of the first failed path
        first_error: Option<(u8, u16)>,
    },
}

impl KvResponse {
    pub fn new(
        status: ResponseStatus,
        server_code: u16,
        bucket: impl Into<String>,
        body: ResponseBody,
    ) -> Self {
        KvResponse {
            status,
            server_code,
            bucket: bucket.into(),
            body,
        }
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Raw status code as reported by the server
    pub fn server_code(&self) -> u16 {
        self.server_code
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }
}
