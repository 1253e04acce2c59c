//! Partitions work across worker threads, spawns and joins them, aggregates
//! counters, and prints the final report.
//!
//! Grounded on `examples/original_source/weighttp/src/weighttp.c::main`:
//! the print-before-spawn ordering, the exit-code taxonomy, and the report
//! format below are all taken from there. Thread spawn/join uses
//! `std::thread` directly (the teacher has no thread pool of its own to
//! imitate — it spawns `tokio` tasks, not OS threads — so this is the one
//! place the port reaches for bare `std::thread`, which is exactly the
//! primitive spec.md §5 calls for: "exactly T OS threads").

use crate::config::{partition, Config};
use crate::errors::SetupError;
use crate::stats::Stats;
use crate::worker;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub fn run(config: Config) -> Result<Stats, SetupError> {
    let config = Arc::new(config);

    let reqs = partition(config.req_count, config.thread_count);
    let concurs = partition(config.concur_count as u64, config.thread_count);

    println!();
    println!("starting benchmark...");

    let start = Instant::now();
    let mut handles = Vec::with_capacity(config.thread_count as usize);

    for i in 0..config.thread_count {
        let worker_id = i + 1;
        let worker_reqs = reqs[i as usize];
        let worker_concur = concurs[i as usize] as u32;

        println!(
            "spawning thread #{worker_id}: {worker_concur} concurrent requests, {worker_reqs} total requests"
        );
        info!(worker_id, worker_reqs, worker_concur, "spawning worker");

        let config = Arc::clone(&config);
        let handle = std::thread::Builder::new()
            .name(format!("weighttp-worker-{worker_id}"))
            .spawn(move || worker::run(worker_id, config, worker_reqs, worker_concur))
            .map_err(SetupError::ThreadSpawn)?;
        handles.push(handle);
    }

    let mut total = Stats::default();
    for handle in handles {
        let worker_stats = handle
            .join()
            .map_err(|_| SetupError::ThreadJoin)?
            .map_err(|_| SetupError::ThreadJoin)?;
        total.merge(&worker_stats);
    }

    let elapsed = start.elapsed();
    print_report(&total, elapsed);

    Ok(total)
}

fn print_report(stats: &Stats, elapsed: std::time::Duration) {
    let sec = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    let micros = elapsed.subsec_micros() % 1000;

    let elapsed_secs = elapsed.as_secs_f64();
    let rps = if elapsed_secs > 0.0 {
        stats.req_done as f64 / elapsed_secs
    } else {
        0.0
    };
    let kbps = if elapsed_secs > 0.0 {
        stats.bytes_total as f64 / elapsed_secs / 1024.0
    } else {
        0.0
    };

    println!();
    println!(
        "finished in {sec} sec, {millis} millisec and {micros} microsec, {rps:.2} req/s, {kbps:.2} kbyte/s"
    );
    println!(
        "requests: {} total, {} started, {} done, {} succeeded, {} failed, {} errored",
        stats.req_todo, stats.req_started, stats.req_done, stats.req_success, stats.req_failed, stats.req_error
    );
    println!(
        "status codes: {} 2xx, {} 3xx, {} 4xx, {} 5xx",
        stats.req_2xx, stats.req_3xx, stats.req_4xx, stats.req_5xx
    );
    println!(
        "traffic: {} bytes total, {} bytes http, {} bytes data",
        stats.bytes_total,
        stats.bytes_total - stats.bytes_body,
        stats.bytes_body
    );
}

pub fn print_banner() {
    println!(
        "weighttp {} - a lightweight and simple webserver benchmarking tool",
        env!("CARGO_PKG_VERSION")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    fn spawn_server(response: &'static [u8], accepts: usize) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for _ in 0..accepts {
                if let Ok((mut stream, _)) = listener.accept() {
                    let mut buf = [0u8; 1024];
                    use std::io::Read;
                    let _ = stream.read(&mut buf);
                    let _ = stream.write_all(response);
                }
            }
        });
        addr
    }

    #[test]
    fn s1_single_request_single_worker() {
        let addr = spawn_server(b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nABC", 1);
        let config = Config {
            request_bytes: b"GET / HTTP/1.1\r\n\r\n".to_vec(),
            server_addr: addr,
            keep_alive: false,
            thread_count: 1,
            concur_count: 1,
            req_count: 1,
        };

        let stats = run(config).unwrap();

        assert_eq!(stats.req_todo, 1);
        assert_eq!(stats.req_done, 1);
        assert_eq!(stats.req_success, 1);
        assert_eq!(stats.req_failed, 0);
        assert_eq!(stats.req_2xx, 1);
        assert_eq!(stats.bytes_body, 3);
    }

    #[test]
    fn s3_immediate_close_counts_as_failed_and_errored() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for _ in 0..4 {
                if let Ok((stream, _)) = listener.accept() {
                    drop(stream); // close immediately after connecting
                }
            }
        });

        let config = Config {
            request_bytes: b"GET / HTTP/1.1\r\n\r\n".to_vec(),
            server_addr: addr,
            keep_alive: false,
            thread_count: 1,
            concur_count: 2,
            req_count: 4,
        };

        let stats = run(config).unwrap();

        assert_eq!(stats.req_done, 4);
        assert_eq!(stats.req_failed, 4);
        assert!(stats.req_error >= 1);
    }

    #[test]
    fn invariant_started_equals_done_equals_req_count() {
        let addr = spawn_server(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n", 10);
        let config = Config {
            request_bytes: b"GET / HTTP/1.1\r\n\r\n".to_vec(),
            server_addr: addr,
            keep_alive: false,
            thread_count: 3,
            concur_count: 3,
            req_count: 10,
        };

        let stats = run(config).unwrap();

        assert_eq!(stats.req_started, 10);
        assert_eq!(stats.req_done, 10);
        assert_eq!(stats.req_success + stats.req_failed, stats.req_done);
    }
}
