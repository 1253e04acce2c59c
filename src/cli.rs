//! Command-line argument parsing and validation.
//!
//! `clap`'s derive API is the CLI-parsing precedent used throughout the
//! retrieval pack (see `examples/other_examples/manifests/*/Cargo.toml` and
//! e.g. `examples/maithanhduyan-rust-code/simbank/crates/cli/src/main.rs`);
//! the teacher itself has no CLI since it is a server library, so this
//! module is grounded on the wider pack rather than on the teacher.

use clap::Parser;

/// `weighttp [options] <url>` — a lightweight and simple webserver
/// benchmarking tool.
#[derive(Parser, Debug)]
#[command(name = "weighttp", version, disable_version_flag = true)]
pub struct Cli {
    /// Total number of requests to perform.
    #[arg(short = 'n', value_name = "N")]
    pub req_count: u64,

    /// Number of worker threads to use.
    #[arg(short = 't', value_name = "T", default_value_t = 1)]
    pub thread_count: u32,

    /// Number of concurrent clients.
    #[arg(short = 'c', value_name = "C", default_value_t = 1)]
    pub concur_count: u32,

    /// Enable keep-alive.
    #[arg(short = 'k')]
    pub keep_alive: bool,

    /// Prefer IPv6 address when resolving the host.
    #[arg(short = '6')]
    pub use_ipv6: bool,

    /// Add a header to the request (repeatable).
    #[arg(short = 'H', value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Print version and exit.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Target URL, e.g. http://localhost:8080/
    pub url: String,
}

impl Cli {
    /// Parses `argv`, leaving exit-code policy to the caller: `--help` and
    /// `--version`/`-v` are not errors (spec.md §6 reserves exit codes for
    /// setup failures, not informational output), while a malformed
    /// argument must surface as the same exit code 1 as any other
    /// argument/URL/resolution error rather than clap's own default.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Cli::try_parse()
    }
}
