use std::{error, fmt, io, net::AddrParseError};

/// Fatal errors raised before the benchmark starts: argument parsing, URL
/// parsing, DNS resolution, thread spawn/join failure.
///
/// Surfaced once on stderr; the process exits with the matching code from
/// [`SetupError::exit_code`].
#[derive(Debug)]
pub enum SetupError {
    /// Argument combination fails the `T <= C <= N` / `N < u64::MAX` sanity
    /// check, or a flag value failed to parse.
    InvalidArgs(String),
    /// URL did not start with `http://` or was otherwise malformed.
    InvalidUrl(String),
    /// URL scheme was `https://`; TLS is out of scope for this tool.
    UnsupportedScheme,
    /// A user-supplied header repeated `Host:`.
    DuplicateHostHeader,
    /// `getaddrinfo`-equivalent resolution produced no usable address.
    ResolutionFailed(String),
    /// A worker's socket/thread allocation failed before the run began.
    ThreadSpawn(io::Error),
    /// A worker thread panicked or could not be joined.
    ThreadJoin,
}

impl SetupError {
    /// Process exit code mandated by the CLI contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::InvalidArgs(_)
            | SetupError::InvalidUrl(_)
            | SetupError::UnsupportedScheme
            | SetupError::DuplicateHostHeader
            | SetupError::ResolutionFailed(_) => 1,
            SetupError::ThreadSpawn(_) => 2,
            SetupError::ThreadJoin => 3,
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::InvalidArgs(msg) => write!(f, "insane arguments: {msg}"),
            SetupError::InvalidUrl(msg) => write!(f, "invalid url: {msg}"),
            SetupError::UnsupportedScheme => {
                write!(f, "https:// is not supported (no TLS in this tool)")
            }
            SetupError::DuplicateHostHeader => {
                write!(f, "duplicate Host: header supplied")
            }
            SetupError::ResolutionFailed(host) => {
                write!(f, "could not resolve host: {host}")
            }
            SetupError::ThreadSpawn(err) => write!(f, "failed to spawn worker thread: {err}"),
            SetupError::ThreadJoin => write!(f, "failed to join a worker thread"),
        }
    }
}

impl error::Error for SetupError {}

impl From<io::Error> for SetupError {
    fn from(err: io::Error) -> Self {
        SetupError::ThreadSpawn(err)
    }
}

impl From<AddrParseError> for SetupError {
    fn from(err: AddrParseError) -> Self {
        SetupError::ResolutionFailed(err.to_string())
    }
}

/// Per-connection errors: never fatal to the process, counted into
/// `req_error`/`req_failed` and drive the connection straight to
/// [`crate::client::ConnState::Error`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConnError {
    /// `connect()`/`read()`/`write()` failed with something other than
    /// EINTR/EAGAIN/EWOULDBLOCK/EINPROGRESS/EALREADY/EISCONN.
    Io,
    /// Peer closed before the request was fully written.
    PeerClosedEarly,
    /// Status line did not start with the literal `HTTP/1.1 ` prefix.
    BadStatusLine,
    /// Status code was not three decimal digits, or not in `[100, 599]`.
    InvalidStatusCode,
    /// Status line (or a header line) exceeded the 1024-byte scan limit
    /// without a terminating CRLF.
    LineTooLong,
    /// `Content-Length` value contained a non-digit byte.
    InvalidContentLength,
    /// `Connection:` header carried a value other than `close`/`keep-alive`.
    InvalidConnection,
    /// `Transfer-Encoding:` header carried a value other than `chunked`.
    InvalidTransferEncoding,
    /// Chunked body had a malformed hex chunk-size or missing chunk
    /// delimiter.
    MalformedChunk,
    /// Non-chunked body with keep-alive framing but no `Content-Length`.
    MissingContentLength,
    /// The 32 KiB client buffer filled before headers finished parsing.
    HeaderBufferFull,
}

impl fmt::Display for ConnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl error::Error for ConnError {}
