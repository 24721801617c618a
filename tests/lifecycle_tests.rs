//! Lifecycle Tests
//!
//! Correlation, ordering and buffer-ownership behavior of the codec across
//! whole request lifetimes: success, retry, failure, cancellation and
//! connection teardown.

use bytes::Bytes;
use coralkv::codec::{ConnContext, DecodeOutcome, KvCodec};
use coralkv::protocol::{
    code, KvRequest, RequestKind, ResponseBody, ResponseFrame, ResponseStatus, StoreOp,
};
use coralkv::{CoralError, Environment, Payload};

const HOST: &str = "node1.coral.local";

fn response_frame(opaque: u32, status: u16) -> ResponseFrame {
    ResponseFrame {
        opcode: 0,
        status,
        opaque,
        cas: 0,
        extras: Bytes::new(),
        key: Bytes::new(),
        value: Bytes::new(),
    }
}

fn stat_frame(opaque: u32, key: &str, value: &str) -> ResponseFrame {
    ResponseFrame {
        opcode: 0,
        status: code::SUCCESS,
        opaque,
        cas: 0,
        extras: Bytes::new(),
        key: Bytes::copy_from_slice(key.as_bytes()),
        value: Bytes::copy_from_slice(value.as_bytes()),
    }
}

fn get_request(opaque: u32) -> KvRequest {
    KvRequest::new(
        opaque,
        0,
        "default",
        RequestKind::Get {
            key: Bytes::from_static(b"k"),
        },
    )
}

fn upsert_request(opaque: u32, payload: Payload) -> KvRequest {
    KvRequest::with_payload(
        opaque,
        0,
        "default",
        RequestKind::Store {
            op: StoreOp::Upsert,
            key: Bytes::from_static(b"k"),
            flags: 0,
            expiry: 0,
            cas: 0,
        },
        payload,
    )
}

fn decode(
    codec: &mut KvCodec,
    env: &Environment,
    frame: &ResponseFrame,
) -> coralkv::Result<DecodeOutcome> {
    let cx = ConnContext {
        env,
        remote_hostname: HOST,
    };
    codec.decode(&cx, frame)
}

// =============================================================================
// Opaque Correlation
// =============================================================================

#[test]
fn test_responses_decode_against_matching_requests_in_order() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    for opaque in [10, 11, 12] {
        codec.encode(get_request(opaque)).unwrap();
    }
    assert_eq!(codec.in_flight(), 3);

    for opaque in [10, 11, 12] {
        match decode(&mut codec, &env, &response_frame(opaque, code::SUCCESS)).unwrap() {
            DecodeOutcome::Response { request, .. } => {
                assert_eq!(request.opaque(), opaque);
            }
            DecodeOutcome::StatPending => panic!("Expected a finished response"),
        }
    }
    assert_eq!(codec.in_flight(), 0);
}

#[test]
fn test_opaque_mismatch_is_fatal_and_teardown_releases_payloads() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    let payload = Payload::new(&b"body"[..]);
    let probe = payload.probe();
    codec.encode(upsert_request(10, payload)).unwrap();
    codec.encode(get_request(11)).unwrap();

    // head expects opaque 10; opaque 11 arriving first is a broken stream
    let err = decode(&mut codec, &env, &response_frame(11, code::SUCCESS)).unwrap_err();
    assert!(err.is_fatal());
    match err {
        CoralError::OpaqueMismatch { expected, actual } => {
            assert_eq!(expected, 10);
            assert_eq!(actual, 11);
        }
        other => panic!("Expected OpaqueMismatch, got {:?}", other),
    }

    // endpoint reaction: tear the connection down
    assert_eq!(codec.close(), 2);
    assert_eq!(codec.in_flight(), 0);
    assert_eq!(probe.handle_count(), 0);
}

#[test]
fn test_response_without_in_flight_request_is_fatal() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    let err = decode(&mut codec, &env, &response_frame(1, code::SUCCESS)).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, CoralError::NoRequestInFlight(1)));
}

#[test]
fn test_cancelled_request_leaves_mismatching_opaque_behind() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    codec.encode(get_request(20)).unwrap();
    codec.encode(get_request(21)).unwrap();
    assert!(codec.cancel(20));

    // the server still answers opaque 20; the head is now 21
    let err = decode(&mut codec, &env, &response_frame(20, code::SUCCESS)).unwrap_err();
    assert!(matches!(
        err,
        CoralError::OpaqueMismatch {
            expected: 21,
            actual: 20
        }
    ));
}

// =============================================================================
// Payload Ownership
// =============================================================================

#[test]
fn test_payload_released_on_success() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    let payload = Payload::new(&b"body"[..]);
    let probe = payload.probe();
    assert_eq!(probe.handle_count(), 1);

    codec.encode(upsert_request(1, payload)).unwrap();
    // one handle in the queued request, one retained for the retry window
    assert_eq!(probe.handle_count(), 2);

    match decode(&mut codec, &env, &response_frame(1, code::SUCCESS)).unwrap() {
        DecodeOutcome::Response { request, .. } => {
            assert!(request.payload().is_none());
        }
        DecodeOutcome::StatPending => panic!("Expected a finished response"),
    }
    assert_eq!(probe.handle_count(), 0);
}

#[test]
fn test_payload_released_on_non_retry_failure() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    let payload = Payload::new(&b"body"[..]);
    let probe = payload.probe();
    codec.encode(upsert_request(1, payload)).unwrap();

    match decode(&mut codec, &env, &response_frame(1, code::ERR_EXISTS)).unwrap() {
        DecodeOutcome::Response { response, request } => {
            assert_eq!(response.status(), ResponseStatus::Exists);
            assert!(request.payload().is_none());
        }
        DecodeOutcome::StatPending => panic!("Expected a finished response"),
    }
    assert_eq!(probe.handle_count(), 0);
}

#[test]
fn test_retry_keeps_payload_for_reencode() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    let payload = Payload::new(&b"body"[..]);
    let probe = payload.probe();
    codec.encode(upsert_request(1, payload)).unwrap();

    // NOT_MY_VBUCKET: the request must come back still re-encodable
    let request = match decode(
        &mut codec,
        &env,
        &response_frame(1, code::ERR_NOT_MY_VBUCKET),
    )
    .unwrap()
    {
        DecodeOutcome::Response { response, request } => {
            assert_eq!(response.status(), ResponseStatus::Retry);
            assert!(response.status().should_retry());
            request
        }
        DecodeOutcome::StatPending => panic!("Expected a finished response"),
    };
    assert!(request.payload().is_some());
    assert_eq!(probe.handle_count(), 1);

    // retry round: same request, same bytes, then a terminal response
    codec.encode(request).unwrap();
    assert_eq!(probe.handle_count(), 2);
    decode(&mut codec, &env, &response_frame(1, code::SUCCESS)).unwrap();
    assert_eq!(probe.handle_count(), 0);
}

#[test]
fn test_cancel_releases_payload_exactly_once() {
    let mut codec = KvCodec::new();

    let payload = Payload::new(&b"body"[..]);
    let probe = payload.probe();
    codec.encode(upsert_request(1, payload)).unwrap();
    assert_eq!(probe.handle_count(), 2);

    assert!(codec.cancel(1));
    assert_eq!(probe.handle_count(), 0);
    assert!(!codec.cancel(1));
    assert_eq!(codec.in_flight(), 0);
}

#[test]
fn test_close_releases_every_pending_payload() {
    let mut codec = KvCodec::new();

    let first = Payload::new(&b"a"[..]);
    let second = Payload::new(&b"b"[..]);
    let probes = [first.probe(), second.probe()];

    codec.encode(upsert_request(1, first)).unwrap();
    codec.encode(get_request(2)).unwrap();
    codec.encode(upsert_request(3, second)).unwrap();

    assert_eq!(codec.close(), 3);
    for probe in &probes {
        assert_eq!(probe.handle_count(), 0);
    }
}

// =============================================================================
// STAT Streams
// =============================================================================

#[test]
fn test_stat_stream_dequeues_only_on_empty_key() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    codec
        .encode(KvRequest::new(
            5,
            -1,
            "default",
            RequestKind::Stat {
                key: Bytes::from_static(b"mem"),
            },
        ))
        .unwrap();

    assert!(matches!(
        decode(&mut codec, &env, &stat_frame(5, "k1", "v1")).unwrap(),
        DecodeOutcome::StatPending
    ));
    assert!(matches!(
        decode(&mut codec, &env, &stat_frame(5, "k2", "v2")).unwrap(),
        DecodeOutcome::StatPending
    ));
    // the head stays queued for the whole stream
    assert_eq!(codec.in_flight(), 1);

    match decode(&mut codec, &env, &stat_frame(5, "", "")).unwrap() {
        DecodeOutcome::Response { response, .. } => match response.body() {
            ResponseBody::Stats { entries } => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].key, "k1");
                assert_eq!(entries[0].value, "v1");
                assert_eq!(entries[1].key, "k2");
                assert_eq!(entries[1].value, "v2");
            }
            other => panic!("Expected Stats body, got {:?}", other),
        },
        DecodeOutcome::StatPending => panic!("Empty key must finalize the stream"),
    }
    assert_eq!(codec.in_flight(), 0);
}

#[test]
fn test_stat_stream_followed_by_other_requests() {
    let mut codec = KvCodec::new();
    let env = Environment::default();

    codec
        .encode(KvRequest::new(
            5,
            -1,
            "default",
            RequestKind::Stat {
                key: Bytes::new(),
            },
        ))
        .unwrap();
    codec.encode(get_request(6)).unwrap();

    decode(&mut codec, &env, &stat_frame(5, "uptime", "100")).unwrap();
    decode(&mut codec, &env, &stat_frame(5, "", "")).unwrap();

    // the GET queued behind the stream decodes normally afterwards
    match decode(&mut codec, &env, &response_frame(6, code::SUCCESS)).unwrap() {
        DecodeOutcome::Response { request, .. } => assert_eq!(request.opaque(), 6),
        DecodeOutcome::StatPending => panic!("Expected a finished response"),
    }
}
