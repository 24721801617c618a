//! CoralKV CLI
//!
//! Issues single operations against a live CoralKV data node over a
//! blocking TCP stream: encode, write, read, decode. Uses one socket for
//! sequential write-then-read; there is no pipelining here, so the
//! in-flight queue never holds more than one request.
//!
//! This is a diagnostic tool, not a client: it performs no handshake and
//! no vbucket map lookup, so the partition must be supplied by hand on
//! sharded buckets.

use std::net::TcpStream;
use std::time::Duration;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use coralkv::codec::{ConnContext, DecodeOutcome, KvCodec};
use coralkv::protocol::{
    read_response, write_request, KvRequest, PartitionState, RequestKind, ResponseBody, StoreOp,
};
use coralkv::{Environment, Payload, Result};

/// CoralKV CLI
#[derive(Parser, Debug)]
#[command(name = "coralkv-cli")]
#[command(about = "CLI for the CoralKV document store")]
#[command(version)]
struct Args {
    /// Data node address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:11210")]
    server: String,

    /// Bucket to operate on
    #[arg(short, long, default_value = "default")]
    bucket: String,

    /// Partition (vBucket) the key routes to
    #[arg(short, long, default_value = "0")]
    partition: i16,

    /// Connection timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a document by key
    Get {
        /// The key to get
        key: String,
    },

    /// Upsert a document
    Set {
        /// The key to set
        key: String,

        /// The document body
        value: String,

        /// Document flags
        #[arg(long, default_value = "0")]
        flags: u32,

        /// Expiry in seconds (0 = never)
        #[arg(long, default_value = "0")]
        expiry: u32,
    },

    /// Remove a document
    Del {
        /// The key to remove
        key: String,
    },

    /// Adjust a numeric document
    Incr {
        /// The key to adjust
        key: String,

        /// Signed delta to apply
        #[arg(long, default_value = "1")]
        delta: i64,

        /// Initial value if the document does not exist
        #[arg(long, default_value = "0")]
        initial: u64,
    },

    /// Stream a statistics group
    Stats {
        /// Statistics group (empty = default group)
        #[arg(default_value = "")]
        group: String,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch current mutation tokens for all partitions
    Tokens,

    /// Send a protocol NOOP
    Ping,
}

/// One blocking connection driving the codec
struct Session {
    stream: TcpStream,
    codec: KvCodec,
    env: Environment,
    host: String,
    next_opaque: u32,
}

impl Session {
    fn connect(server: &str, timeout_ms: u64) -> Result<Self> {
        let stream = TcpStream::connect(server)?;
        stream.set_read_timeout(Some(Duration::from_millis(timeout_ms)))?;
        stream.set_write_timeout(Some(Duration::from_millis(timeout_ms)))?;

        let host = server.split(':').next().unwrap_or(server).to_string();
        Ok(Session {
            stream,
            codec: KvCodec::new(),
            env: Environment::default(),
            host,
            next_opaque: 1,
        })
    }

    fn next_opaque(&mut self) -> u32 {
        let opaque = self.next_opaque;
        self.next_opaque = self.next_opaque.wrapping_add(1);
        opaque
    }

    /// Encode, write, then read until the request resolves
    fn roundtrip(&mut self, request: KvRequest) -> Result<coralkv::protocol::KvResponse> {
        let frame = self.codec.encode(request)?;
        write_request(&mut self.stream, &frame)?;

        loop {
            let frame = read_response(&mut self.stream, self.env.max_body_size)?;
            let cx = ConnContext {
                env: &self.env,
                remote_hostname: &self.host,
            };
            match self.codec.decode(&cx, &frame)? {
                DecodeOutcome::Response { response, .. } => return Ok(response),
                DecodeOutcome::StatPending => continue,
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut session = Session::connect(&args.server, args.timeout)?;
    let opaque = session.next_opaque();
    let bucket = args.bucket.clone();
    let partition = args.partition;

    let request = match &args.command {
        Commands::Get { key } => KvRequest::new(
            opaque,
            partition,
            bucket,
            RequestKind::Get {
                key: Bytes::copy_from_slice(key.as_bytes()),
            },
        ),
        Commands::Set {
            key,
            value,
            flags,
            expiry,
        } => KvRequest::with_payload(
            opaque,
            partition,
            bucket,
            RequestKind::Store {
                op: StoreOp::Upsert,
                key: Bytes::copy_from_slice(key.as_bytes()),
                flags: *flags,
                expiry: *expiry,
                cas: 0,
            },
            Payload::new(Bytes::copy_from_slice(value.as_bytes())),
        ),
        Commands::Del { key } => KvRequest::new(
            opaque,
            partition,
            bucket,
            RequestKind::Remove {
                key: Bytes::copy_from_slice(key.as_bytes()),
                cas: 0,
            },
        ),
        Commands::Incr {
            key,
            delta,
            initial,
        } => KvRequest::new(
            opaque,
            partition,
            bucket,
            RequestKind::Counter {
                key: Bytes::copy_from_slice(key.as_bytes()),
                delta: *delta,
                initial: *initial,
                expiry: 0,
            },
        ),
        Commands::Stats { group, .. } => KvRequest::new(
            opaque,
            partition,
            bucket,
            RequestKind::Stat {
                key: Bytes::copy_from_slice(group.as_bytes()),
            },
        ),
        Commands::Tokens => KvRequest::new(
            opaque,
            partition,
            bucket,
            RequestKind::GetAllMutationTokens {
                state: PartitionState::Any,
            },
        ),
        Commands::Ping => KvRequest::keep_alive(opaque),
    };

    let response = session.roundtrip(request)?;

    if !response.status().is_success() {
        tracing::warn!(
            status = ?response.status(),
            code = response.server_code(),
            "Server reported failure"
        );
    }

    match response.into_body() {
        ResponseBody::Get { cas, flags, value } => {
            println!("{}", String::from_utf8_lossy(&value));
            tracing::debug!(cas, flags, "Get complete");
        }
        ResponseBody::Store { cas, mutation_token } => {
            println!("OK (cas 0x{:x})", cas);
            if let Some(token) = mutation_token {
                tracing::debug!(?token, "Mutation token");
            }
        }
        ResponseBody::Remove { cas, .. } => {
            println!("OK (cas 0x{:x})", cas);
        }
        ResponseBody::Counter { value, .. } => {
            println!("{}", value);
        }
        ResponseBody::Stats { entries } => {
            if matches!(args.command, Commands::Stats { json: true, .. }) {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("{}\t{}", entry.key, entry.value);
                }
            }
        }
        ResponseBody::MutationTokens { tokens } => {
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        ResponseBody::KeepAlive => {
            println!("PONG");
        }
        other => {
            println!("{:?}", other);
        }
    }

    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,coralkv=info"));

    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
