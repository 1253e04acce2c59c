//! weighttp - a lightweight and simple multi-threaded HTTP/1.1 benchmarking tool.
//!
//! Given a target URL, a total request count, a concurrency level, and a
//! worker-thread count, `weighttp` issues HTTP/1.1 GET requests over a
//! fixed number of concurrent TCP connections partitioned across worker
//! threads, parses every response, and reports aggregate throughput,
//! status-code counts, and byte counters.
//!
//! # Scope
//!
//! This is a benchmarking client, not a server: no TLS, no HTTP/2+, no
//! pipelining, no redirects, no request bodies beyond GET. See `SPEC_FULL.md`
//! in the repository root for the full specification this crate implements.
//!
//! # Architecture
//!
//! - [`request`] — forges the fixed request bytes once and resolves the
//!   target host to a socket address.
//! - [`client`] — the per-connection state machine and incremental
//!   HTTP/1.1 response parser.
//! - [`worker`] — owns one OS thread's event loop, its client pool, and its
//!   local counters.
//! - [`coordinator`] — partitions work, spawns and joins worker threads,
//!   aggregates counters, prints the report.
//! - [`config`] and [`cli`] — immutable run configuration and its CLI
//!   surface.
//! - [`stats`] — per-worker counters and their cross-thread merge.
//! - [`errors`] — the setup-error/connection-error taxonomy.
//! - [`mux`] — the I/O multiplexer adapter's liveness-gate contract.

pub mod cli;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod mux;
pub mod request;
pub mod stats;
pub mod worker;
