//! Protocol Module
//!
//! Defines the binary wire protocol spoken with CoralKV data nodes: a
//! memcached-derived framing with vendor opcodes for bucket configuration,
//! sub-document operations, observe/durability and mutation-token
//! telemetry.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌──────────────────────── 24-byte header ─────────────────────────┐
//! │ magic ‖ opcode ‖ key len ‖ extras len ‖ type ‖ partition/status │
//! │ total body length ‖ opaque ‖ CAS                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ extras ‖ key ‖ value                                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All multi-byte integers are big-endian. Requests carry the partition
//! (vBucket) in the reserved field; responses carry the status code there.

mod frame;
mod opcode;
mod request;
mod response;
mod status;

pub use frame::{
    parse_request, parse_response, read_response, write_request, RequestFrame, ResponseFrame,
    HEADER_SIZE, MAGIC_REQUEST, MAGIC_RESPONSE,
};
pub use opcode::{Opcode, SubdocOp, SUBDOC_BITMASK_MKDIR_P};
pub use request::{
    KvRequest, LookupSpec, MutationSpec, PartitionState, RequestKind, StoreOp, NO_PARTITION,
};
pub use response::{
    KvResponse, MutationToken, ObserveSeqnoResult, ObserveStatus, ResponseBody, StatEntry,
    SubdocResult,
};
pub use status::{code, ResponseStatus};
