//! Request definitions
//!
//! Typed requests flowing from the request pipeline into the codec. Each
//! request carries the connection-level correlation fields (opaque,
//! partition, bucket) plus a variant describing the operation. Payload
//! buffers are held at the request level so the codec can retain them
//! across encode and release them exactly once on a terminal response,
//! cancellation or teardown.

use bytes::Bytes;

use crate::buffer::Payload;
use crate::protocol::opcode::SubdocOp;

/// Partition routing value meaning "no partition"
pub const NO_PARTITION: i16 = -1;

/// A typed request awaiting encoding
#[derive(Debug)]
pub struct KvRequest {
    /// Client-chosen correlation ID, unique per connection
    opaque: u32,

    /// Partition (vBucket) the document lives on; [`NO_PARTITION`] if none
    partition: i16,

    /// Bucket the request is scoped to
    bucket: String,

    /// Caller-owned payload buffer for value-carrying operations
    payload: Option<Payload>,

    /// The operation itself
    kind: RequestKind,
}

/// Store operation flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Create the document; fail if it exists
    Insert,

    /// Create or overwrite the document
    Upsert,

    /// Overwrite the document; fail if it does not exist (honors CAS)
    Replace,
}

/// Partition-state filter for mutation-token telemetry requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionState {
    /// All partitions regardless of state
    Any,
    Active,
    Replica,
    Pending,
    Dead,
}

impl PartitionState {
    /// The wire filter value; `Any` is special-cased to empty extras
    pub fn value(self) -> u32 {
        match self {
            PartitionState::Any => 0,
            PartitionState::Active => 1,
            PartitionState::Replica => 2,
            PartitionState::Pending => 3,
            PartitionState::Dead => 4,
        }
    }
}

/// One lookup inside a multi-path sub-document request
///
/// The wire body is pre-serialized by the caller; the command list is kept
/// so the decoder can pair per-path results back up in order.
#[derive(Debug, Clone)]
pub struct LookupSpec {
    pub op: SubdocOp,
    pub path: String,
}

/// One mutation inside a multi-path sub-document request
#[derive(Debug, Clone)]
pub struct MutationSpec {
    pub op: SubdocOp,
    pub path: String,
}

/// Operation variants
#[derive(Debug)]
pub enum RequestKind {
    /// Fetch a document
    Get { key: Bytes },

    /// Fetch a document and write-lock it
    GetAndLock { key: Bytes, lock_expiry: u32 },

    /// Fetch a document and refresh its expiry
    GetAndTouch { key: Bytes, expiry: u32 },

    /// Fetch a document from a replica
    GetReplica { key: Bytes, replica: u16 },

    /// Fetch the current bucket configuration document
    GetBucketConfig,

    /// Insert/upsert/replace a document (payload carries the body)
    Store {
        op: StoreOp,
        key: Bytes,
        flags: u32,
        expiry: u32,
        /// Only honored for [`StoreOp::Replace`]
        cas: u64,
    },

    /// Delete a document
    Remove { key: Bytes, cas: u64 },

    /// Atomically adjust a numeric document
    Counter {
        key: Bytes,
        delta: i64,
        initial: u64,
        expiry: u32,
    },

    /// Refresh a document's expiry
    Touch { key: Bytes, expiry: u32 },

    /// Release a write lock taken by get-and-lock
    Unlock { key: Bytes, cas: u64 },

    /// Append bytes to a document (payload carries the fragment)
    Append { key: Bytes, cas: u64 },

    /// Prepend bytes to a document (payload carries the fragment)
    Prepend { key: Bytes, cas: u64 },

    /// Query replication/persistence state of a document
    Observe { key: Bytes, master: bool },

    /// Query sequence numbers for a partition
    ObserveSeqno { vbucket_uuid: u64, master: bool },

    /// Protocol NOOP emitted on idle
    KeepAlive,

    /// Start a statistics stream; empty key requests the default group
    Stat { key: Bytes },

    /// Fetch current mutation tokens for partitions in a given state
    GetAllMutationTokens { state: PartitionState },

    /// Single-path sub-document operation (payload = path ‖ fragment)
    SubdocSingle {
        op: SubdocOp,
        key: Bytes,
        path_len: u16,
        /// Create missing intermediate JSON path nodes (mutations only)
        mkdir_p: bool,
        /// Only honored for mutations, and only when non-zero
        expiry: u32,
        /// Only honored for mutations
        cas: u64,
    },

    /// Multi-path sub-document lookup (payload = serialized spec list)
    SubdocMultiLookup { key: Bytes, commands: Vec<LookupSpec> },

    /// Multi-path sub-document mutation (payload = serialized spec list)
    SubdocMultiMutation {
        key: Bytes,
        commands: Vec<MutationSpec>,
        expiry: u32,
        cas: u64,
    },
}

impl RequestKind {
    /// Whether this operation carries a caller-owned payload buffer
    ///
    /// Observe bodies are codec-owned and excluded on purpose.
    pub fn carries_payload(&self) -> bool {
        matches!(
            self,
            RequestKind::Store { .. }
                | RequestKind::Append { .. }
                | RequestKind::Prepend { .. }
                | RequestKind::SubdocSingle { .. }
                | RequestKind::SubdocMultiLookup { .. }
                | RequestKind::SubdocMultiMutation { .. }
        )
    }
}

impl KvRequest {
    /// Create a request without a payload buffer
    pub fn new(opaque: u32, partition: i16, bucket: impl Into<String>, kind: RequestKind) -> Self {
        KvRequest {
            opaque,
            partition,
            bucket: bucket.into(),
            payload: None,
            kind,
        }
    }

    /// Create a request that carries a caller-owned payload buffer
    pub fn with_payload(
        opaque: u32,
        partition: i16,
        bucket: impl Into<String>,
        kind: RequestKind,
        payload: Payload,
    ) -> Self {
        KvRequest {
            opaque,
            partition,
            bucket: bucket.into(),
            payload: Some(payload),
            kind,
        }
    }

    /// The synthetic NOOP the codec emits on idle
    pub fn keep_alive(opaque: u32) -> Self {
        KvRequest::new(opaque, 0, "", RequestKind::KeepAlive)
    }

    pub fn opaque(&self) -> u32 {
        self.opaque
    }

    pub fn partition(&self) -> i16 {
        self.partition
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// The document key this request targets; empty for key-less operations
    pub fn key(&self) -> &[u8] {
        match &self.kind {
            RequestKind::Get { key }
            | RequestKind::GetAndLock { key, .. }
            | RequestKind::GetAndTouch { key, .. }
            | RequestKind::GetReplica { key, .. }
            | RequestKind::Store { key, .. }
            | RequestKind::Remove { key, .. }
            | RequestKind::Counter { key, .. }
            | RequestKind::Touch { key, .. }
            | RequestKind::Unlock { key, .. }
            | RequestKind::Append { key, .. }
            | RequestKind::Prepend { key, .. }
            | RequestKind::Observe { key, .. }
            | RequestKind::Stat { key }
            | RequestKind::SubdocSingle { key, .. }
            | RequestKind::SubdocMultiLookup { key, .. }
            | RequestKind::SubdocMultiMutation { key, .. } => key.as_ref(),
            RequestKind::GetBucketConfig
            | RequestKind::ObserveSeqno { .. }
            | RequestKind::KeepAlive
            | RequestKind::GetAllMutationTokens { .. } => &[],
        }
    }

    /// Borrow the payload buffer, if any
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Take the payload buffer out of the request, releasing ownership
    ///
    /// After this returns, the request can no longer be re-encoded.
    pub fn take_payload(&mut self) -> Option<Payload> {
        self.payload.take()
    }
}
