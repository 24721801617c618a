//! # CoralKV
//!
//! Client protocol codec for the CoralKV distributed document store:
//! - Memcached-derived binary framing with vendor opcodes
//! - Opaque-correlated in-flight FIFO per connection
//! - Sub-document, observe and mutation-token telemetry operations
//! - Feature-gated mutation-token extraction after handshake
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Request Pipeline                          │
//! │                 (typed KvRequest stream)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      KvCodec                                │
//! │   encoder ──► in-flight FIFO ──► decoder                    │
//! └──────────┬──────────────────────────────▲───────────────────┘
//!            │                              │
//!            ▼                              │
//!   ┌─────────────────┐            ┌─────────────────┐
//!   │  Wire frames    │            │  Response frames│
//!   │  (TCP socket)   │            │  (TCP socket)   │
//!   └─────────────────┘            └─────────────────┘
//! ```
//!
//! The codec is a synchronous transform: it neither owns the socket nor
//! suspends. Transport, pooling, retry orchestration and cluster topology
//! are the surrounding client's business.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod buffer;
pub mod codec;
pub mod features;
pub mod protocol;
pub mod sink;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use buffer::Payload;
pub use codec::{ConnContext, DecodeOutcome, KvCodec};
pub use config::Environment;
pub use error::{CoralError, Result};
pub use features::{ServerFeature, ServerFeatures};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the CoralKV client codec
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
