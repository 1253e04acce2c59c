//! One reusable TCP connection slot: the connection state machine and the
//! incremental HTTP/1.1 response parser.
//!
//! Both concerns live in this one file because the source they are
//! grounded on, `examples/original_source/weighttp/src/client.c`, combines
//! them the same way (`client_state_machine` and `client_parse` in a
//! single translation unit operating on the same `struct Client`). The
//! async state-machine driving loop itself follows the teacher's
//! `server/connection.rs::HttpConnection::run` shape: a tagged state enum
//! driven by a loop that `.await`s readiness and re-enters itself, per
//! spec.md §9's "the `goto start;` idiom becomes a bounded loop until a
//! state requires external readiness".

use crate::config::Config;
use crate::errors::ConnError;
use memchr::memchr;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use tokio::net::TcpStream;

pub const CLIENT_BUFFER_SIZE: usize = 32768;

/// Minimum bytes needed before a status line can possibly be complete:
/// `len("HTTP/1.1 200\r\n")`.
const MIN_STATUS_LINE_LEN: usize = 14;

/// Anti-DoS bound on an unterminated status/header/chunk-size line.
const MAX_LINE_SCAN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Start,
    Connecting,
    Writing,
    Reading,
    Error,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Start,
    Header,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    B2xx,
    B3xx,
    B4xx,
    B5xx,
}

/// Outcome of one call into [`Client::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseOutcome {
    NeedMore,
    Done,
}

/// One reusable TCP connection slot, driven by [`Client::run_request`]
/// until every request assigned to it has completed.
pub struct Client {
    socket: Option<TcpStream>,
    state: ConnState,
    parser_state: ParserState,

    buffer: Box<[u8; CLIENT_BUFFER_SIZE]>,
    buffer_offset: usize,
    parser_offset: usize,
    request_offset: usize,

    keepalive: bool,
    status_success: bool,
    success: bool,
    chunked: bool,
    status_bucket: Option<StatusBucket>,

    chunk_size: Option<u64>,
    chunk_received: u64,

    content_length: Option<u64>,
    bytes_received: u64,
    header_size: usize,

    errored: bool,
    last_error: Option<ConnError>,
}

/// Per-request result handed back to the worker loop once a client reaches
/// [`ConnState::End`].
pub struct RequestResult {
    pub success: bool,
    /// Whether this request passed through [`ConnState::Error`] — always
    /// implies `!success`, but `!success` does not imply this (a cleanly
    /// parsed 4xx/5xx response is a failure that is not an error).
    pub errored: bool,
    pub status_bucket: Option<StatusBucket>,
    pub bytes_received: u64,
    pub header_size: usize,
    pub last_error: Option<ConnError>,
}

impl Client {
    pub fn new(config: &Config) -> Self {
        Client {
            socket: None,
            state: ConnState::Start,
            parser_state: ParserState::Start,
            buffer: Box::new([0u8; CLIENT_BUFFER_SIZE]),
            buffer_offset: 0,
            parser_offset: 0,
            request_offset: 0,
            keepalive: config.keep_alive,
            status_success: false,
            success: false,
            chunked: false,
            status_bucket: None,
            chunk_size: None,
            chunk_received: 0,
            content_length: None,
            bytes_received: 0,
            header_size: 0,
            errored: false,
            last_error: None,
        }
    }

    /// Resets all per-request fields. Preserves the socket and re-enters
    /// `Writing` directly when `keepalive` holds; otherwise performs an
    /// orderly shutdown, drops the socket, and re-enters `Start`.
    /// `keepalive` is re-read from `config.keep_alive` either way, per
    /// spec.md §4.3 "Reset semantics".
    fn reset(&mut self, config: &Config) {
        let reuse = self.keepalive;

        self.parser_state = ParserState::Start;
        self.buffer_offset = 0;
        self.parser_offset = 0;
        self.request_offset = 0;
        self.status_success = false;
        self.success = false;
        self.chunked = false;
        self.status_bucket = None;
        self.chunk_size = None;
        self.chunk_received = 0;
        self.content_length = None;
        self.bytes_received = 0;
        self.header_size = 0;
        self.errored = false;
        self.last_error = None;
        self.keepalive = config.keep_alive;

        if reuse {
            self.state = ConnState::Writing;
        } else {
            if let Some(stream) = self.socket.take() {
                let _ = stream.into_std().and_then(|s| s.shutdown(std::net::Shutdown::Write));
            }
            self.state = ConnState::Start;
        }
    }

    /// Drives one full request/response cycle to completion: connect (or
    /// reuse), write, read, parse. Returns once the client reaches `End`.
    pub async fn run_request(&mut self, config: &Config) -> RequestResult {
        if self.socket.is_none() {
            self.state = ConnState::Start;
        }

        loop {
            match self.state {
                ConnState::Start => self.do_start(config),
                ConnState::Connecting => self.do_connecting().await,
                ConnState::Writing => self.do_writing(config).await,
                ConnState::Reading => self.do_reading(config).await,
                // Q1: the C source falls through ERROR into END without an
                // explicit break. Made explicit here: the Error arm's entry
                // action runs, then the loop re-enters with state == End.
                ConnState::Error => {
                    self.errored = true;
                    self.keepalive = false;
                    self.success = false;
                    self.state = ConnState::End;
                }
                ConnState::End => break,
            }
        }

        let result = RequestResult {
            success: self.success,
            errored: self.errored,
            status_bucket: self.status_bucket,
            bytes_received: self.bytes_received,
            header_size: self.header_size,
            last_error: self.last_error,
        };
        self.reset(config);
        result
    }

    fn fail(&mut self, err: ConnError) {
        self.last_error = Some(err);
        self.state = ConnState::Error;
    }

    // ---- connection state machine -----------------------------------

    fn do_start(&mut self, config: &Config) {
        let domain = if config.server_addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };

        let socket = match Socket::new(domain, Type::STREAM, Some(Protocol::TCP)) {
            Ok(socket) => socket,
            Err(_) => return self.fail(ConnError::Io),
        };
        if socket.set_nonblocking(true).is_err() {
            return self.fail(ConnError::Io);
        }

        match socket.connect(&config.server_addr.into()) {
            Ok(()) => {
                self.socket = tokio_stream_from(socket).ok();
                if self.socket.is_none() {
                    return self.fail(ConnError::Io);
                }
                self.state = ConnState::Writing;
            }
            // On Windows, a non-blocking connect() reports WSAEWOULDBLOCK,
            // which `io::ErrorKind` does map to `WouldBlock`. On Unix it
            // reports EINPROGRESS, which `io::ErrorKind` does not map to
            // `WouldBlock` (only EAGAIN/EWOULDBLOCK do) — that has to be
            // matched on the raw errno instead.
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || is_connect_in_progress(&e) => {
                self.socket = tokio_stream_from(socket).ok();
                if self.socket.is_none() {
                    return self.fail(ConnError::Io);
                }
                self.state = ConnState::Connecting;
            }
            Err(_) => self.fail(ConnError::Io),
        }
    }

    async fn do_connecting(&mut self) {
        let Some(stream) = self.socket.as_ref() else {
            return self.fail(ConnError::Io);
        };
        if stream.writable().await.is_err() {
            return self.fail(ConnError::Io);
        }
        match stream.take_error() {
            Ok(None) => self.state = ConnState::Writing,
            _ => self.fail(ConnError::Io),
        }
    }

    async fn do_writing(&mut self, config: &Config) {
        loop {
            let Some(stream) = self.socket.as_ref() else {
                return self.fail(ConnError::Io);
            };
            if stream.writable().await.is_err() {
                return self.fail(ConnError::Io);
            }

            let remaining = &config.request_bytes[self.request_offset..];
            match stream.try_write(remaining) {
                Ok(0) => {
                    self.state = ConnState::End;
                    return;
                }
                Ok(n) => {
                    self.request_offset += n;
                    if self.request_offset == config.request_bytes.len() {
                        self.state = ConnState::Reading;
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return self.fail(ConnError::Io),
            }
        }
    }

    async fn do_reading(&mut self, config: &Config) {
        loop {
            if self.buffer_offset >= CLIENT_BUFFER_SIZE - 1 {
                // buffer_offset reached CLIENT_BUFFER_SIZE without the
                // parser completing headers.
                if self.parser_state != ParserState::Body {
                    return self.fail(ConnError::HeaderBufferFull);
                }
            }

            let Some(stream) = self.socket.as_ref() else {
                return self.fail(ConnError::Io);
            };
            if stream.readable().await.is_err() {
                return self.fail(ConnError::Io);
            }

            let capacity = CLIENT_BUFFER_SIZE - 1 - self.buffer_offset;
            match stream.try_read(&mut self.buffer[self.buffer_offset..self.buffer_offset + capacity]) {
                Ok(0) => {
                    // HTTP/1.0-style framing-by-close success classification.
                    if self.parser_state == ParserState::Body
                        && !self.keepalive
                        && self.status_success
                        && !self.chunked
                        && self.content_length.is_none()
                    {
                        self.success = true;
                        self.state = ConnState::End;
                    } else {
                        self.fail(ConnError::PeerClosedEarly);
                    }
                    return;
                }
                Ok(n) => {
                    self.buffer_offset += n;
                    self.bytes_received += n as u64;

                    match self.parse() {
                        Ok(ParseOutcome::NeedMore) => continue,
                        Ok(ParseOutcome::Done) => {
                            self.success = self.status_success;
                            self.state = ConnState::End;
                            return;
                        }
                        Err(err) => return self.fail(err),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return self.fail(ConnError::Io),
            }
        }
    }

    // ---- response parser ---------------------------------------------

    /// Dispatches on `parser_state`, replacing the C source's recursive
    /// re-entry (`client_parse` calling itself on leftover bytes) with an
    /// explicit loop — the same bytes are re-examined without a fresh
    /// `read()`, matching spec.md §4.2's "the parser is re-entered
    /// immediately on the same buffer" tie-break.
    fn parse(&mut self) -> Result<ParseOutcome, ConnError> {
        loop {
            match self.parser_state {
                ParserState::Start => match self.parse_status_line()? {
                    ParseOutcome::NeedMore if self.parser_state == ParserState::Header => continue,
                    other => return Ok(other),
                },
                ParserState::Header => match self.parse_headers()? {
                    ParseOutcome::NeedMore if self.parser_state == ParserState::Body => continue,
                    other => return Ok(other),
                },
                ParserState::Body => return self.parse_body(),
            }
        }
    }

    fn window(&self) -> &[u8] {
        &self.buffer[self.parser_offset..self.buffer_offset]
    }

    fn parse_status_line(&mut self) -> Result<ParseOutcome, ConnError> {
        if self.buffer_offset < MIN_STATUS_LINE_LEN {
            return Ok(ParseOutcome::NeedMore);
        }

        let window = self.window();
        if window.len() < 9 || &window[..9] != b"HTTP/1.1 " {
            return Err(ConnError::BadStatusLine);
        }

        let code_bytes = &window[9..window.len().min(12)];
        if code_bytes.len() < 3 || !code_bytes.iter().all(u8::is_ascii_digit) {
            return Err(ConnError::InvalidStatusCode);
        }
        let code: u16 = std::str::from_utf8(&code_bytes[..3]).unwrap().parse().unwrap();

        match memchr(b'\r', window) {
            Some(pos) if window.get(pos + 1) == Some(&b'\n') => {
                let (bucket, status_success) = classify_status(code)?;
                self.status_bucket = Some(bucket);
                self.status_success = status_success;
                self.parser_offset += pos + 2;
                self.parser_state = ParserState::Header;
                Ok(ParseOutcome::NeedMore)
            }
            _ if window.len() < MAX_LINE_SCAN => Ok(ParseOutcome::NeedMore),
            _ => Err(ConnError::LineTooLong),
        }
    }

    fn parse_headers(&mut self) -> Result<ParseOutcome, ConnError> {
        loop {
            let window = self.window();
            let Some(pos) = memchr(b'\r', window) else {
                return if window.len() < MAX_LINE_SCAN {
                    Ok(ParseOutcome::NeedMore)
                } else {
                    Err(ConnError::LineTooLong)
                };
            };
            if window.get(pos + 1) != Some(&b'\n') {
                return if window.len() < MAX_LINE_SCAN {
                    Ok(ParseOutcome::NeedMore)
                } else {
                    Err(ConnError::LineTooLong)
                };
            }

            if pos == 0 {
                self.parser_offset += 2;
                self.header_size = self.parser_offset;
                self.parser_state = ParserState::Body;
                return Ok(ParseOutcome::NeedMore);
            }

            let line = self.buffer[self.parser_offset..self.parser_offset + pos].to_vec();
            self.match_header(&line)?;
            self.parser_offset += pos + 2;
        }
    }

    fn match_header(&mut self, line: &[u8]) -> Result<(), ConnError> {
        let Some(colon) = memchr(b':', line) else {
            return Ok(());
        };
        let name = &line[..colon];
        let mut value = &line[colon + 1..];
        while value.first() == Some(&b' ') {
            value = &value[1..];
        }
        while value.last() == Some(&b' ') {
            value = &value[..value.len() - 1];
        }

        if name.eq_ignore_ascii_case(b"content-length") {
            let n = parse_decimal_u64(value).ok_or(ConnError::InvalidContentLength)?;
            self.content_length = Some(n);
        } else if name.eq_ignore_ascii_case(b"connection") {
            if value.eq_ignore_ascii_case(b"close") {
                self.keepalive = false;
            } else if value.eq_ignore_ascii_case(b"keep-alive") {
                // keepalive already seeded from config.keep_alive at reset.
            } else {
                return Err(ConnError::InvalidConnection);
            }
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            if value.eq_ignore_ascii_case(b"chunked") {
                self.chunked = true;
            } else {
                return Err(ConnError::InvalidTransferEncoding);
            }
        }
        Ok(())
    }

    fn parse_body(&mut self) -> Result<ParseOutcome, ConnError> {
        if self.chunked {
            self.parse_chunked_body()
        } else {
            self.parse_content_length_body()
        }
    }

    fn parse_content_length_body(&mut self) -> Result<ParseOutcome, ConnError> {
        let Some(content_length) = self.content_length else {
            return Err(ConnError::MissingContentLength);
        };
        let expected_total = (self.header_size as u64).saturating_add(content_length);

        if self.bytes_received >= expected_total {
            Ok(ParseOutcome::Done)
        } else {
            self.buffer_offset = 0;
            self.parser_offset = 0;
            Ok(ParseOutcome::NeedMore)
        }
    }

    fn parse_chunked_body(&mut self) -> Result<ParseOutcome, ConnError> {
        loop {
            // Q3: the C source computes `size - header_size` even when
            // `size < header_size`. Here the equivalent quantity is always
            // derived via checked_sub of two cursors into the same buffer,
            // so it cannot go negative; the `unwrap_or(0)` makes the guard
            // explicit instead of relying on the invariant alone.
            let remaining = self.buffer_offset.checked_sub(self.parser_offset).unwrap_or(0);
            if remaining == 0 {
                self.buffer_offset = 0;
                self.parser_offset = 0;
                return Ok(ParseOutcome::NeedMore);
            }

            match self.chunk_size {
                None => {
                    let window = self.window();
                    let Some(size_end) = window.iter().position(|&b| b == b';' || b == b'\r')
                    else {
                        return if window.len() < MAX_LINE_SCAN {
                            Ok(ParseOutcome::NeedMore)
                        } else {
                            Err(ConnError::MalformedChunk)
                        };
                    };
                    if size_end == 0 {
                        return Err(ConnError::MalformedChunk);
                    }
                    let size = parse_hex_u64(&window[..size_end]).ok_or(ConnError::MalformedChunk)?;

                    let Some(crlf_rel) = memchr(b'\r', &window[size_end..]) else {
                        return if window.len() < MAX_LINE_SCAN {
                            Ok(ParseOutcome::NeedMore)
                        } else {
                            Err(ConnError::MalformedChunk)
                        };
                    };
                    let crlf_pos = size_end + crlf_rel;
                    if window.get(crlf_pos + 1) != Some(&b'\n') {
                        return Err(ConnError::MalformedChunk);
                    }
                    self.parser_offset += crlf_pos + 2;

                    if size == 0 {
                        return Ok(ParseOutcome::Done);
                    }
                    self.chunk_size = Some(size);
                    self.chunk_received = 0;
                }
                Some(size) => {
                    let remaining = self.buffer_offset.checked_sub(self.parser_offset).unwrap_or(0);
                    let need = size.saturating_sub(self.chunk_received);
                    let take = need.min(remaining as u64) as usize;
                    self.parser_offset += take;
                    self.chunk_received += take as u64;

                    if self.chunk_received < size {
                        // Discard the bytes just consumed so a chunk larger
                        // than one read doesn't fill the buffer (client.c
                        // resets both cursors after every partial consume).
                        self.buffer_offset = 0;
                        self.parser_offset = 0;
                        return Ok(ParseOutcome::NeedMore);
                    }

                    let window = self.window();
                    if window.len() < 2 {
                        return Ok(ParseOutcome::NeedMore);
                    }
                    if &window[..2] != b"\r\n" {
                        return Err(ConnError::MalformedChunk);
                    }
                    self.parser_offset += 2;
                    self.chunk_size = None;
                }
            }
        }
    }
}

fn classify_status(code: u16) -> Result<(StatusBucket, bool), ConnError> {
    match code {
        200..=299 => Ok((StatusBucket::B2xx, true)),
        300..=399 => Ok((StatusBucket::B3xx, true)),
        400..=499 => Ok((StatusBucket::B4xx, false)),
        500..=599 => Ok((StatusBucket::B5xx, false)),
        _ => Err(ConnError::InvalidStatusCode),
    }
}

/// Strict decimal parse for `Content-Length`. Q2: any non-digit byte is an
/// explicit parse error — never saturates to `u64::MAX` the way the C
/// `str_to_uint64` does.
fn parse_decimal_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    Some(n)
}

fn parse_hex_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        n = n.checked_mul(16)?.checked_add(digit as u64)?;
    }
    Some(n)
}

fn tokio_stream_from(socket: Socket) -> io::Result<TcpStream> {
    let std_stream: std::net::TcpStream = socket.into();
    TcpStream::from_std(std_stream)
}

/// True if `err` is Unix's EINPROGRESS — the errno a non-blocking
/// `connect()` returns while the handshake is still underway. A no-op on
/// non-Unix targets, where `WouldBlock` already covers this case.
#[cfg(unix)]
fn is_connect_in_progress(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINPROGRESS)
}

#[cfg(not(unix))]
fn is_connect_in_progress(_err: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ParsedUrl;

    fn test_config() -> Config {
        Config {
            request_bytes: b"GET / HTTP/1.1\r\n\r\n".to_vec(),
            server_addr: "127.0.0.1:80".parse().unwrap(),
            keep_alive: false,
            thread_count: 1,
            concur_count: 1,
            req_count: 1,
        }
    }

    fn feed(client: &mut Client, data: &[u8]) -> Result<ParseOutcome, ConnError> {
        let start = client.buffer_offset;
        client.buffer[start..start + data.len()].copy_from_slice(data);
        client.buffer_offset += data.len();
        client.bytes_received += data.len() as u64;
        client.parse()
    }

    #[test]
    fn parses_simple_200_with_content_length() {
        let config = test_config();
        let mut client = Client::new(&config);
        let outcome = feed(&mut client, b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nABC");
        assert_eq!(outcome, Ok(ParseOutcome::Done));
        assert_eq!(client.status_bucket, Some(StatusBucket::B2xx));
        assert!(client.status_success);
    }

    #[test]
    fn parser_idempotent_across_chunk_boundaries() {
        // Testable property 6: one chunk vs many chunks yields the same outcome.
        let config = test_config();
        let whole = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nABC";

        let mut one_shot = Client::new(&config);
        let one_shot_outcome = feed(&mut one_shot, whole);

        let mut byte_at_a_time = Client::new(&config);
        let mut last = Ok(ParseOutcome::NeedMore);
        for byte in whole {
            last = feed(&mut byte_at_a_time, &[*byte]);
        }

        assert_eq!(one_shot_outcome, Ok(ParseOutcome::Done));
        assert_eq!(last, Ok(ParseOutcome::Done));
        assert_eq!(one_shot.status_bucket, byte_at_a_time.status_bucket);
        assert_eq!(one_shot.status_success, byte_at_a_time.status_success);
    }

    #[test]
    fn rejects_bad_status_prefix() {
        let config = test_config();
        let mut client = Client::new(&config);
        assert_eq!(
            feed(&mut client, b"HTTP/1.0 200 OK\r\n\r\n"),
            Err(ConnError::BadStatusLine)
        );
    }

    #[test]
    fn rejects_non_digit_status_code() {
        let config = test_config();
        let mut client = Client::new(&config);
        assert_eq!(
            feed(&mut client, b"HTTP/1.1 2AA OK\r\n\r\n"),
            Err(ConnError::InvalidStatusCode)
        );
    }

    #[test]
    fn content_length_non_digit_is_an_error_not_a_saturation() {
        // Q2.
        let config = test_config();
        let mut client = Client::new(&config);
        assert_eq!(
            feed(&mut client, b"HTTP/1.1 200 OK\r\nContent-Length: 12x4\r\n\r\n"),
            Err(ConnError::InvalidContentLength)
        );
    }

    #[test]
    fn chunked_body_parses_to_completion() {
        let config = test_config();
        let mut client = Client::new(&config);
        let response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n1\r\nA\r\n2\r\nBC\r\n0\r\n\r\n";
        assert_eq!(feed(&mut client, response), Ok(ParseOutcome::Done));
        assert!(client.chunked);
    }

    #[test]
    fn chunked_body_waits_for_more_on_partial_chunk() {
        let config = test_config();
        let mut client = Client::new(&config);
        let outcome = feed(
            &mut client,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nAB",
        );
        assert_eq!(outcome, Ok(ParseOutcome::NeedMore));
    }

    #[test]
    fn partial_chunk_discards_consumed_bytes_from_buffer() {
        // A chunk spanning multiple reads must not accumulate consumed
        // bytes in the buffer, or a chunk bigger than CLIENT_BUFFER_SIZE
        // would starve do_reading of read capacity (never a literal error
        // here since feed() bypasses do_reading, but buffer_offset/
        // parser_offset must still both land back at zero).
        let config = test_config();
        let mut client = Client::new(&config);
        let outcome = feed(
            &mut client,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nAB",
        );
        assert_eq!(outcome, Ok(ParseOutcome::NeedMore));
        assert_eq!(client.buffer_offset, 0);
        assert_eq!(client.parser_offset, 0);
        assert_eq!(client.chunk_received, 2);
    }

    #[test]
    fn chunk_larger_than_one_read_completes_across_many_reads() {
        let config = test_config();
        let mut client = Client::new(&config);
        feed(
            &mut client,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n10\r\n",
        )
        .unwrap();

        // Feed the 16-byte chunk body one byte at a time: each call must
        // keep succeeding (NeedMore) rather than ever running out of
        // buffer room, proving consumed bytes don't pile up.
        let body = b"0123456789abcdef";
        let mut last = Ok(ParseOutcome::NeedMore);
        for &byte in &body[..body.len() - 1] {
            last = feed(&mut client, &[byte]);
            assert_eq!(last, Ok(ParseOutcome::NeedMore));
        }
        last = feed(&mut client, &body[body.len() - 1..]);
        assert_eq!(last, Ok(ParseOutcome::NeedMore));

        let outcome = feed(&mut client, b"\r\n0\r\n\r\n");
        assert_eq!(outcome, Ok(ParseOutcome::Done));
    }

    #[test]
    fn unterminated_status_line_waits_until_1024_bytes() {
        let config = test_config();
        let mut client = Client::new(&config);
        let mut junk = b"HTTP/1.1 200 ".to_vec();
        junk.extend(std::iter::repeat(b'x').take(100));
        assert_eq!(feed(&mut client, &junk), Ok(ParseOutcome::NeedMore));
    }

    #[test]
    #[cfg(unix)]
    fn connect_in_progress_recognizes_einprogress_not_ewouldblock() {
        let einprogress = io::Error::from_raw_os_error(libc::EINPROGRESS);
        assert!(is_connect_in_progress(&einprogress));

        // EAGAIN/EWOULDBLOCK already surface as io::ErrorKind::WouldBlock
        // and are handled by that check, not this one.
        let ewouldblock = io::Error::from_raw_os_error(libc::EWOULDBLOCK);
        assert!(!is_connect_in_progress(&ewouldblock));
    }

    #[test]
    fn connection_close_disables_keepalive() {
        let mut config = test_config();
        config.keep_alive = true;
        let mut client = Client::new(&config);
        client.keepalive = true;
        let _ = feed(&mut client, b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 0\r\n\r\n");
        assert!(!client.keepalive);
    }

    #[test]
    fn invalid_connection_value_errors() {
        let config = test_config();
        let mut client = Client::new(&config);
        assert_eq!(
            feed(&mut client, b"HTTP/1.1 200 OK\r\nConnection: sometimes\r\n\r\n"),
            Err(ConnError::InvalidConnection)
        );
    }

    #[test]
    fn status_bucket_classification_covers_all_ranges() {
        for (code, bucket) in [
            (200, StatusBucket::B2xx),
            (301, StatusBucket::B3xx),
            (404, StatusBucket::B4xx),
            (503, StatusBucket::B5xx),
        ] {
            assert_eq!(classify_status(code).unwrap().0, bucket);
        }
        assert!(classify_status(99).is_err());
        assert!(classify_status(600).is_err());
    }

    #[test]
    fn reset_restores_defaults_and_rereads_keep_alive() {
        let mut config = test_config();
        config.keep_alive = false;
        let mut client = Client::new(&config);
        client.buffer_offset = 10;
        client.content_length = Some(5);
        client.keepalive = true; // simulate a response that asked to keep alive
        client.reset(&config);

        assert_eq!(client.buffer_offset, 0);
        assert_eq!(client.content_length, None);
        assert_eq!(client.state, ConnState::Start);
        assert!(!client.keepalive);
    }
}
