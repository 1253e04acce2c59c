//! One OS thread, one cooperative event loop, a slice of the concurrency
//! and request budget.
//!
//! Grounded on `examples/original_source/weighttp/src/worker.c`
//! (`worker_new`/`worker_thread`'s priming-then-run-to-exhaustion shape)
//! and on the teacher's `server/server_impl.rs::Server::build`, which
//! spawns a fixed pool of async tasks pulling work from a shared queue —
//! here the "queue" is simply the shared `req_started` counter each client
//! task races to increment, since there is no external work source to
//! pull from.
//!
//! Each worker gets its own single-threaded Tokio runtime
//! (`Builder::new_current_thread`), satisfying spec.md §2's "each worker
//! runs an independent event loop" literally: one OS thread, one reactor.
//! Clients run as `spawn_local` tasks under a `LocalSet` so their shared
//! [`Stats`] can be a plain `Rc<RefCell<_>>` — single-threaded interior
//! mutability, no atomics, matching spec.md §9's aggregation note.

use crate::client::{Client, StatusBucket};
use crate::config::Config;
use crate::mux::Gate;
use crate::stats::Stats;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Runs one worker to completion and returns its final counters.
///
/// `reqs` is this worker's share of `config.req_count`; `concur` is its
/// share of `config.concur_count` (both from [`crate::config::partition`]).
pub fn run(id: u32, config: Arc<Config>, reqs: u64, concur: u32) -> std::io::Result<Stats> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    let local = tokio::task::LocalSet::new();

    let stats = Rc::new(RefCell::new(Stats::new(reqs)));
    let progress_interval = (reqs / 10).max(1);

    // worker.c::worker_thread only primes clients for which
    // req_started < req_todo; equivalently, at most `reqs` client slots
    // are ever started even if `concur` is larger.
    let num_clients = concur.min(reqs.min(u32::MAX as u64) as u32).max(1);
    let gate = Rc::new(Gate::new(0));

    let stats_for_run = Rc::clone(&stats);
    let gate_for_run = Rc::clone(&gate);
    local.block_on(&runtime, async move {
        let mut handles = Vec::with_capacity(num_clients as usize);
        for _ in 0..num_clients {
            let config = Arc::clone(&config);
            let stats = Rc::clone(&stats_for_run);
            let gate = Rc::clone(&gate_for_run);
            gate.ref_client();
            handles.push(tokio::task::spawn_local(run_client(
                id,
                config,
                stats,
                gate,
                progress_interval,
            )));
        }
        for handle in handles {
            let _ = handle.await;
        }
    });

    // spec.md §4.6: "the loop returns when the count is zero". Every
    // client task unrefs the gate exactly once on the way out, so this
    // must hold once every task has been joined above.
    debug_assert!(gate.is_quiescent());

    let stats = Rc::try_unwrap(stats)
        .unwrap_or_else(|rc| RefCell::new(*rc.borrow()))
        .into_inner();
    Ok(stats)
}

async fn run_client(
    worker_id: u32,
    config: Arc<Config>,
    stats: Rc<RefCell<Stats>>,
    gate: Rc<Gate>,
    progress_interval: u64,
) {
    let mut client = Client::new(&config);

    loop {
        {
            let mut stats = stats.borrow_mut();
            if stats.req_started >= stats.req_todo {
                gate.unref_client();
                break;
            }
            stats.req_started += 1;
        }

        let result = client.run_request(&config).await;

        if result.errored {
            if let Some(err) = result.last_error {
                debug!(worker_id, %err, "connection error");
            }
        }

        let mut stats = stats.borrow_mut();
        stats.req_done += 1;
        stats.bytes_total += result.bytes_received;

        if result.success {
            stats.req_success += 1;
            stats.bytes_body += result.bytes_received.saturating_sub(result.header_size as u64);
        } else {
            stats.req_failed += 1;
        }
        if result.errored {
            stats.req_error += 1;
        }

        match result.status_bucket {
            Some(StatusBucket::B2xx) => stats.req_2xx += 1,
            Some(StatusBucket::B3xx) => stats.req_3xx += 1,
            Some(StatusBucket::B4xx) => stats.req_4xx += 1,
            Some(StatusBucket::B5xx) => stats.req_5xx += 1,
            None => {}
        }

        if worker_id == 1 && stats.req_done % progress_interval == 0 {
            let percent = stats.req_done * 100 / stats.req_todo;
            println!("progress: {percent:3}% done");
        }
    }
}
