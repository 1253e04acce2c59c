//! Immutable, shared benchmark configuration.
//!
//! Built once by the coordinator from parsed CLI arguments, then shared by
//! an `Arc` across every worker thread — no field is ever mutated after
//! [`Config::build`] returns. Grounded on the teacher's `limits.rs` style of
//! plain `Default`-able configuration structs, adapted here to a single
//! struct built from validated CLI input instead of a builder chain, since
//! this tool has one configuration surface (the CLI), not a library API.

use crate::cli::Cli;
use crate::errors::SetupError;
use crate::request::{forge_request, resolve_host, ParsedUrl};
use std::net::SocketAddr;

/// Read-only benchmark parameters shared across all worker threads.
#[derive(Debug)]
pub struct Config {
    pub request_bytes: Vec<u8>,
    pub server_addr: SocketAddr,
    pub keep_alive: bool,
    pub thread_count: u32,
    pub concur_count: u32,
    pub req_count: u64,
}

impl Config {
    pub fn build(cli: &Cli) -> Result<Self, SetupError> {
        validate_counts(cli.thread_count, cli.concur_count, cli.req_count)?;

        let url = ParsedUrl::parse(&cli.url)?;
        let server_addr = resolve_host(&url, cli.use_ipv6)?;
        let request_bytes = forge_request(&url, &cli.headers, cli.keep_alive)?;

        Ok(Config {
            request_bytes,
            server_addr,
            keep_alive: cli.keep_alive,
            thread_count: cli.thread_count,
            concur_count: cli.concur_count,
            req_count: cli.req_count,
        })
    }
}

/// `T <= C <= N` and `N < u64::MAX`, per spec.md §6.
fn validate_counts(thread_count: u32, concur_count: u32, req_count: u64) -> Result<(), SetupError> {
    if thread_count == 0 {
        return Err(SetupError::InvalidArgs("thread count must be > 0".into()));
    }
    if concur_count == 0 {
        return Err(SetupError::InvalidArgs("concurrency must be > 0".into()));
    }
    if req_count == 0 {
        return Err(SetupError::InvalidArgs("request count must be > 0".into()));
    }
    if req_count == u64::MAX {
        return Err(SetupError::InvalidArgs("request count must be < u64::MAX".into()));
    }
    if (thread_count as u64) > (concur_count as u64) {
        return Err(SetupError::InvalidArgs("thread count must be <= concurrency".into()));
    }
    if (concur_count as u64) > req_count {
        return Err(SetupError::InvalidArgs(
            "concurrency must be <= request count".into(),
        ));
    }
    Ok(())
}

/// Splits `total` into `parts` shares, the first `total % parts` shares
/// getting one extra unit. Used for both the per-worker request count and
/// per-worker concurrency count (`original_source/weighttp/src/weighttp.c::main`).
pub fn partition(total: u64, parts: u32) -> Vec<u64> {
    let parts = parts as u64;
    let base = total / parts;
    let rest = total % parts;
    (0..parts)
        .map(|i| base + if i < rest { 1 } else { 0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_even() {
        assert_eq!(partition(10, 2), vec![5, 5]);
    }

    #[test]
    fn partition_uneven() {
        assert_eq!(partition(10, 3), vec![4, 3, 3]);
        assert_eq!(partition(10, 3).iter().sum::<u64>(), 10);
    }

    #[test]
    fn partition_more_parts_than_total() {
        assert_eq!(partition(2, 5), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn validate_rejects_zero() {
        assert!(validate_counts(0, 1, 1).is_err());
        assert!(validate_counts(1, 0, 1).is_err());
        assert!(validate_counts(1, 1, 0).is_err());
    }

    #[test]
    fn validate_rejects_thread_gt_concur() {
        assert!(validate_counts(3, 2, 10).is_err());
    }

    #[test]
    fn validate_rejects_concur_gt_req() {
        assert!(validate_counts(1, 10, 5).is_err());
    }

    #[test]
    fn validate_accepts_sane_args() {
        assert!(validate_counts(2, 4, 100).is_ok());
    }
}
