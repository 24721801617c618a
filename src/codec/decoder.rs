//! Response decoding
//!
//! Dispatch is by the variant of the in-flight head request; the response
//! opcode is never consulted because the opaque has already correlated the
//! pair. The match is exhaustive over request variants, so every operation
//! the encoder can emit has a decode rule.

use bytes::{Buf, Bytes};

use crate::codec::stats::StatStream;
use crate::error::{CoralError, Result};
use crate::protocol::{
    KvRequest, MutationToken, ObserveSeqnoResult, ObserveStatus, RequestKind, ResponseBody,
    ResponseFrame, ResponseStatus, SubdocResult,
};

/// Interpret a response frame against the request it answers
///
/// Returns `None` while a STAT stream is still accumulating; the caller
/// must keep the request in flight until a body is produced.
pub fn decode_body(
    request: &KvRequest,
    frame: &ResponseFrame,
    status: ResponseStatus,
    seq_on_mutation: bool,
    remote_hostname: &str,
    stats: &mut StatStream,
) -> Result<Option<ResponseBody>> {
    let body = match request.kind() {
        // ---------------------------------------------------------------------
        // Common responses
        // ---------------------------------------------------------------------
        RequestKind::Get { .. }
        | RequestKind::GetAndLock { .. }
        | RequestKind::GetAndTouch { .. }
        | RequestKind::GetReplica { .. } => {
            let flags = if frame.extras.len() >= 4 {
                (&frame.extras[..4]).get_u32()
            } else {
                0
            };
            ResponseBody::Get {
                cas: frame.cas,
                flags,
                value: frame.value.clone(),
            }
        }

        RequestKind::GetBucketConfig => ResponseBody::BucketConfig {
            config: frame.value.clone(),
            hostname: remote_hostname.to_string(),
        },

        RequestKind::Store { .. } => ResponseBody::Store {
            cas: frame.cas,
            mutation_token: extract_token(request, frame, status, seq_on_mutation),
        },

        RequestKind::Remove { .. } => ResponseBody::Remove {
            cas: frame.cas,
            mutation_token: extract_token(request, frame, status, seq_on_mutation),
        },

        // ---------------------------------------------------------------------
        // Sub-document responses
        // ---------------------------------------------------------------------
        RequestKind::SubdocSingle { .. } => {
            // A zero-length fragment collapses to the empty sentinel.
            let value = if frame.value.is_empty() {
                Bytes::new()
            } else {
                frame.value.clone()
            };
            ResponseBody::SubdocSingle {
                cas: frame.cas,
                value,
                mutation_token: extract_token(request, frame, status, seq_on_mutation),
            }
        }

        RequestKind::SubdocMultiLookup { commands, .. } => {
            let results = decode_multi_lookup(commands, frame, status)?;
            ResponseBody::SubdocMultiLookup { results }
        }

        RequestKind::SubdocMultiMutation { commands, .. } => {
            let token = extract_token(request, frame, status, seq_on_mutation);
            let (results, first_error) = decode_multi_mutation(commands, frame, status)?;
            ResponseBody::SubdocMultiMutation {
                cas: frame.cas,
                mutation_token: token,
                results,
                first_error,
            }
        }

        // ---------------------------------------------------------------------
        // Other responses
        // ---------------------------------------------------------------------
        RequestKind::Unlock { .. } => ResponseBody::Unlock,

        RequestKind::Touch { .. } => ResponseBody::Touch,

        RequestKind::Append { .. } => ResponseBody::Append {
            cas: frame.cas,
            mutation_token: extract_token(request, frame, status, seq_on_mutation),
        },

        RequestKind::Prepend { .. } => ResponseBody::Prepend {
            cas: frame.cas,
            mutation_token: extract_token(request, frame, status, seq_on_mutation),
        },

        RequestKind::KeepAlive => ResponseBody::KeepAlive,

        RequestKind::Counter { .. } => {
            let value = if status.is_success() {
                if frame.value.len() < 8 {
                    return Err(CoralError::Protocol(format!(
                        "Counter response body too short: {} bytes",
                        frame.value.len()
                    )));
                }
                (&frame.value[..8]).get_u64()
            } else {
                0
            };
            ResponseBody::Counter {
                cas: frame.cas,
                value,
                mutation_token: extract_token(request, frame, status, seq_on_mutation),
            }
        }

        RequestKind::Stat { .. } => match stats.push(&frame.key, &frame.value) {
            Some(entries) => ResponseBody::Stats { entries },
            None => return Ok(None),
        },

        RequestKind::GetAllMutationTokens { .. } => {
            // One 10-byte record per partition: id (u16) ‖ seqno (u64).
            let mut body = frame.value.clone();
            let mut tokens = Vec::with_capacity(body.len() / 10);
            while body.remaining() >= 10 {
                tokens.push(MutationToken {
                    partition: body.get_u16() as u64,
                    vbucket_uuid: 0,
                    sequence: body.get_u64(),
                    bucket: request.bucket().to_string(),
                });
            }
            ResponseBody::MutationTokens { tokens }
        }

        RequestKind::Observe { master, .. } => {
            let mut observed = ObserveStatus::Unknown(0);
            let mut observed_cas = 0;
            if status.is_success() {
                let mut body = frame.value.clone();
                if body.remaining() < 4 {
                    return Err(CoralError::Protocol(format!(
                        "Observe response body too short: {} bytes",
                        frame.value.len()
                    )));
                }
                let _partition = body.get_u16();
                let key_len = body.get_u16() as usize;
                if body.remaining() < key_len + 9 {
                    return Err(CoralError::Protocol(format!(
                        "Observe response truncated after key length {}",
                        key_len
                    )));
                }
                body.advance(key_len);
                observed = ObserveStatus::from_byte(body.get_u8());
                observed_cas = body.get_u64();
            }
            ResponseBody::Observe {
                master: *master,
                observed,
                observed_cas,
            }
        }

        RequestKind::ObserveSeqno { master, .. } => {
            let result = if status.is_success() {
                Some(decode_observe_seqno(frame)?)
            } else {
                None
            };
            ResponseBody::ObserveSeqno {
                master: *master,
                result,
            }
        }
    };

    Ok(Some(body))
}

/// Extract a mutation token from mutation-response extras
///
/// Tokens exist only when the mutation succeeded, the session negotiated
/// MUTATION_SEQNO with tokens enabled, and the extras actually carry the
/// 16-byte UUID ‖ seqno pair.
fn extract_token(
    request: &KvRequest,
    frame: &ResponseFrame,
    status: ResponseStatus,
    seq_on_mutation: bool,
) -> Option<MutationToken> {
    if !status.is_success() || !seq_on_mutation || frame.extras.len() < 16 {
        return None;
    }

    let mut extras = frame.extras.clone();
    Some(MutationToken {
        partition: request.partition().max(0) as u64,
        vbucket_uuid: extras.get_u64(),
        sequence: extras.get_u64(),
        bucket: request.bucket().to_string(),
    })
}

fn decode_multi_lookup(
    commands: &[crate::protocol::LookupSpec],
    frame: &ResponseFrame,
    status: ResponseStatus,
) -> Result<Vec<SubdocResult>> {
    if !status.is_success() && status != ResponseStatus::SubdocMultiPathFailure {
        return Ok(Vec::new());
    }

    let body_len = frame.value.len();
    let mut body = frame.value.clone();
    let mut results = Vec::with_capacity(commands.len());
    for cmd in commands {
        if body.remaining() < 6 {
            return Err(CoralError::Protocol(format!(
                "Expected {} lookup results, only got {}, total of {} bytes",
                commands.len(),
                results.len(),
                body_len
            )));
        }
        let code = body.get_u16();
        let value_len = body.get_u32() as usize;
        if body.remaining() < value_len {
            return Err(CoralError::Protocol(format!(
                "Lookup result for path '{}' truncated: need {} bytes, {} left",
                cmd.path,
                value_len,
                body.remaining()
            )));
        }
        // Copy into a fresh, correctly-sized buffer per result.
        let value = Bytes::copy_from_slice(&body[..value_len]);
        body.advance(value_len);

        results.push(SubdocResult {
            op: cmd.op,
            path: cmd.path.clone(),
            status: ResponseStatus::from_wire(code),
            server_code: code,
            value,
        });
    }
    Ok(results)
}

#[allow(clippy::type_complexity)]
fn decode_multi_mutation(
    commands: &[crate::protocol::MutationSpec],
    frame: &ResponseFrame,
    status: ResponseStatus,
) -> Result<(Vec<SubdocResult>, Option<(u8, u16)>)> {
    if status.is_success() {
        // Only value-producing commands get an explicit entry in the body;
        // everything else is synthesized as an empty SUCCESS result.
        let mut body = frame.value.clone();
        let mut results = Vec::with_capacity(commands.len());
        let mut next = 0usize;

        while body.remaining() >= 7 {
            let index = body.get_u8() as usize;
            let code = body.get_u16();
            let value_len = body.get_u32() as usize;
            if body.remaining() < value_len {
                return Err(CoralError::Protocol(format!(
                    "Mutation result #{} truncated: need {} bytes, {} left",
                    index,
                    value_len,
                    body.remaining()
                )));
            }
            let value = if value_len > 0 {
                let value = Bytes::copy_from_slice(&body[..value_len]);
                body.advance(value_len);
                value
            } else {
                Bytes::new()
            };

            // Explicit entries must move forward through the command list.
            if next > index {
                return Err(CoralError::Protocol(format!(
                    "Unable to interpret multi mutation response, response index {} \
                     while next available command was #{}",
                    index, next
                )));
            }
            if index >= commands.len() {
                return Err(CoralError::Protocol(format!(
                    "Multi mutation response index {} beyond {} commands",
                    index,
                    commands.len()
                )));
            }

            while next < index {
                results.push(synthesized_success(&commands[next]));
                next += 1;
            }

            let cmd = &commands[index];
            results.push(SubdocResult {
                op: cmd.op,
                path: cmd.path.clone(),
                status: ResponseStatus::from_wire(code),
                server_code: code,
                value,
            });
            next = index + 1;
        }

        while next < commands.len() {
            results.push(synthesized_success(&commands[next]));
            next += 1;
        }

        if results.len() != commands.len() {
            return Err(CoralError::Protocol(format!(
                "Multi mutation spec size and result size differ: {} vs {}",
                commands.len(),
                results.len()
            )));
        }

        Ok((results, None))
    } else if status == ResponseStatus::SubdocMultiPathFailure {
        let mut body = frame.value.clone();
        if body.remaining() < 3 {
            return Err(CoralError::Protocol(format!(
                "Multi mutation failure body too short: {} bytes",
                frame.value.len()
            )));
        }
        let first_error_index = body.get_u8();
        let first_error_code = body.get_u16();
        Ok((Vec::new(), Some((first_error_index, first_error_code))))
    } else {
        Ok((Vec::new(), None))
    }
}

fn synthesized_success(cmd: &crate::protocol::MutationSpec) -> SubdocResult {
    SubdocResult {
        op: cmd.op,
        path: cmd.path.clone(),
        status: ResponseStatus::Success,
        server_code: crate::protocol::code::SUCCESS,
        value: Bytes::new(),
    }
}

fn decode_observe_seqno(frame: &ResponseFrame) -> Result<ObserveSeqnoResult> {
    let mut body = frame.value.clone();
    if body.remaining() < 1 {
        return Err(CoralError::Protocol(
            "Observe-seqno response has no format byte".to_string(),
        ));
    }

    let format = body.get_u8();
    match format {
        0 => {
            if body.remaining() < 26 {
                return Err(CoralError::Protocol(format!(
                    "Observe-seqno format 0 body too short: {} bytes",
                    frame.value.len()
                )));
            }
            Ok(ObserveSeqnoResult::NoFailover {
                partition: body.get_u16(),
                vbucket_uuid: body.get_u64(),
                last_persisted: body.get_u64(),
                current_seqno: body.get_u64(),
            })
        }
        1 => {
            if body.remaining() < 42 {
                return Err(CoralError::Protocol(format!(
                    "Observe-seqno format 1 body too short: {} bytes",
                    frame.value.len()
                )));
            }
            Ok(ObserveSeqnoResult::Failover {
                partition: body.get_u16(),
                vbucket_uuid: body.get_u64(),
                last_persisted: body.get_u64(),
                current_seqno: body.get_u64(),
                old_vbucket_uuid: body.get_u64(),
                last_received: body.get_u64(),
            })
        }
        other => Err(CoralError::Protocol(format!(
            "Unknown format for observe-seqno: {}",
            other
        ))),
    }
}
