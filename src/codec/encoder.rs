//! Request encoding
//!
//! A total function from request variant to wire frame. Dispatch is an
//! exhaustive match, so an unhandled variant is a compile error rather
//! than a runtime surprise. All multi-byte integers are big-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CoralError, Result};
use crate::protocol::{
    KvRequest, Opcode, PartitionState, RequestFrame, RequestKind, StoreOp,
    SUBDOC_BITMASK_MKDIR_P,
};

/// Encode a typed request into a wire frame
///
/// The frame borrows the payload bytes; payload handle bookkeeping is the
/// codec's job, not the encoder's.
pub fn encode_request(request: &KvRequest) -> Result<RequestFrame> {
    // The reserved header field carries the partition when one is set.
    let partition = if request.partition() >= 0 {
        request.partition() as u16
    } else {
        0
    };

    let (opcode, cas, extras, key, value) = match request.kind() {
        RequestKind::Get { key } => (Opcode::Get, 0, Bytes::new(), key.clone(), Bytes::new()),

        RequestKind::GetAndLock { key, lock_expiry } => {
            let mut extras = BytesMut::with_capacity(4);
            extras.put_u32(*lock_expiry);
            (Opcode::GetAndLock, 0, extras.freeze(), key.clone(), Bytes::new())
        }

        RequestKind::GetAndTouch { key, expiry } => {
            let mut extras = BytesMut::with_capacity(4);
            extras.put_u32(*expiry);
            (Opcode::GetAndTouch, 0, extras.freeze(), key.clone(), Bytes::new())
        }

        RequestKind::GetReplica { key, .. } => {
            (Opcode::GetReplica, 0, Bytes::new(), key.clone(), Bytes::new())
        }

        RequestKind::GetBucketConfig => {
            (Opcode::GetBucketConfig, 0, Bytes::new(), Bytes::new(), Bytes::new())
        }

        RequestKind::Store {
            op,
            key,
            flags,
            expiry,
            cas,
        } => {
            let mut extras = BytesMut::with_capacity(8);
            extras.put_u32(*flags);
            extras.put_u32(*expiry);

            // Only replace honors CAS; insert and upsert leave it unset.
            let (opcode, cas) = match op {
                StoreOp::Insert => (Opcode::Insert, 0),
                StoreOp::Upsert => (Opcode::Upsert, 0),
                StoreOp::Replace => (Opcode::Replace, *cas),
            };
            (opcode, cas, extras.freeze(), key.clone(), payload_bytes(request)?)
        }

        RequestKind::Remove { key, cas } => {
            (Opcode::Remove, *cas, Bytes::new(), key.clone(), Bytes::new())
        }

        RequestKind::Counter {
            key,
            delta,
            initial,
            expiry,
        } => {
            let mut extras = BytesMut::with_capacity(20);
            extras.put_u64(delta.unsigned_abs());
            extras.put_u64(*initial);
            extras.put_u32(*expiry);

            let opcode = if *delta < 0 {
                Opcode::CounterDecr
            } else {
                Opcode::CounterIncr
            };
            (opcode, 0, extras.freeze(), key.clone(), Bytes::new())
        }

        RequestKind::Touch { key, expiry } => {
            let mut extras = BytesMut::with_capacity(4);
            extras.put_u32(*expiry);
            (Opcode::Touch, 0, extras.freeze(), key.clone(), Bytes::new())
        }

        RequestKind::Unlock { key, cas } => {
            (Opcode::Unlock, *cas, Bytes::new(), key.clone(), Bytes::new())
        }

        RequestKind::Append { key, cas } => {
            (Opcode::Append, *cas, Bytes::new(), key.clone(), payload_bytes(request)?)
        }

        RequestKind::Prepend { key, cas } => {
            (Opcode::Prepend, *cas, Bytes::new(), key.clone(), payload_bytes(request)?)
        }

        RequestKind::Observe { key, .. } => {
            // The key travels in the body, not in the header key field.
            let mut body = BytesMut::with_capacity(4 + key.len());
            body.put_u16(partition);
            body.put_u16(key.len() as u16);
            body.put_slice(key);
            (Opcode::Observe, 0, Bytes::new(), Bytes::new(), body.freeze())
        }

        RequestKind::ObserveSeqno { vbucket_uuid, .. } => {
            let mut body = BytesMut::with_capacity(8);
            body.put_u64(*vbucket_uuid);
            (Opcode::ObserveSeq, 0, Bytes::new(), Bytes::new(), body.freeze())
        }

        RequestKind::KeepAlive => (Opcode::Noop, 0, Bytes::new(), Bytes::new(), Bytes::new()),

        RequestKind::Stat { key } => (Opcode::Stat, 0, Bytes::new(), key.clone(), Bytes::new()),

        RequestKind::GetAllMutationTokens { state } => {
            let extras = match state {
                PartitionState::Any => Bytes::new(),
                other => {
                    let mut extras = BytesMut::with_capacity(4);
                    extras.put_u32(other.value());
                    extras.freeze()
                }
            };
            (Opcode::GetAllMutationTokens, 0, extras, Bytes::new(), Bytes::new())
        }

        RequestKind::SubdocSingle {
            op,
            key,
            path_len,
            mkdir_p,
            expiry,
            cas,
        } => {
            let mut extras = BytesMut::with_capacity(7);
            extras.put_u16(*path_len);
            if op.is_mutation() && *mkdir_p {
                extras.put_u8(SUBDOC_BITMASK_MKDIR_P);
            } else {
                extras.put_u8(0);
            }
            if op.is_mutation() && *expiry != 0 {
                extras.put_u32(*expiry);
            }

            let cas = if op.is_mutation() { *cas } else { 0 };
            (op.opcode(), cas, extras.freeze(), key.clone(), payload_bytes(request)?)
        }

        RequestKind::SubdocMultiLookup { key, .. } => (
            Opcode::SubdocMultiLookup,
            0,
            Bytes::new(),
            key.clone(),
            payload_bytes(request)?,
        ),

        RequestKind::SubdocMultiMutation {
            key, expiry, cas, ..
        } => {
            let extras = if *expiry != 0 {
                let mut extras = BytesMut::with_capacity(4);
                extras.put_u32(*expiry);
                extras.freeze()
            } else {
                Bytes::new()
            };
            (Opcode::SubdocMultiMutation, *cas, extras, key.clone(), payload_bytes(request)?)
        }
    };

    if !request.kind().carries_payload() && request.payload().is_some() {
        return Err(CoralError::Encode(format!(
            "Request opaque {} carries an unexpected payload buffer",
            request.opaque()
        )));
    }

    Ok(RequestFrame {
        opcode: opcode.as_byte(),
        partition,
        opaque: request.opaque(),
        cas,
        extras,
        key,
        value,
    })
}

/// Fetch the caller payload of a payload-carrying request
fn payload_bytes(request: &KvRequest) -> Result<Bytes> {
    request
        .payload()
        .map(|p| p.as_bytes().clone())
        .ok_or_else(|| {
            CoralError::Encode(format!(
                "Request opaque {} requires a payload buffer but has none",
                request.opaque()
            ))
        })
}
