//! Serial handshake protocol for shipping packed frames to the panel MCU.
//!
//! The wire format interleaves newline-terminated ASCII tokens from the
//! device with raw binary from the host:
//!
//! ```text
//! host -> device   "PULSE"                         (no terminator)
//! device -> host   "OK\n"
//! host -> device   4-byte big-endian payload length
//! device -> host   "READY\n"
//! host -> device   payload in 256-byte chunks, ~2ms apart
//! device -> host   "DONE\n"
//! ```
//!
//! Every failure is terminal for the call: there are no retries and no
//! partial resume. A caller that wants another attempt re-renders, re-packs,
//! and resends the whole frame. The stream has a single owner; two transfer
//! operations must never run concurrently on the same stream.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use epaper_frame::PanelSpec;

/// Device token acknowledging a pulse command.
pub const TOKEN_OK: &str = "OK";
/// Device token signalling readiness for the payload.
pub const TOKEN_READY: &str = "READY";
/// Device token acknowledging a completed transfer.
pub const TOKEN_DONE: &str = "DONE";

/// Pulse command bytes.
pub const PULSE_COMMAND: &[u8] = b"PULSE";

/// Per-line read timeout inside token waits.
pub const LINE_TIMEOUT: Duration = Duration::from_secs(1);

/// Byte-oriented serial stream seam.
///
/// The protocol layer does not open, close, or configure the device; it
/// only needs a blocking read with a native timeout plus buffered writes.
/// `read_byte` must block up to `timeout` and return `Ok(None)` when no
/// byte arrived in time.
pub trait SerialStream {
    /// Read one byte, blocking for at most `timeout`.
    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>>;

    /// Write all of `buf`.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush buffered output to the device.
    fn flush(&mut self) -> io::Result<()>;
}

impl<S: SerialStream + ?Sized> SerialStream for &mut S {
    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        (**self).read_byte(timeout)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Transfer error.
#[derive(Debug)]
pub enum LinkError {
    /// Payload length does not match the panel frame length. Raised before
    /// anything is written to the stream.
    PayloadSizeMismatch { actual: usize, expected: usize },
    /// The expected token never arrived within its deadline. Device state
    /// is unknown to the host from here on.
    HandshakeTimeout {
        token: &'static str,
        waited: Duration,
    },
    /// Stream-level I/O failure.
    Io(io::Error),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadSizeMismatch { actual, expected } => {
                write!(f, "payload size {} != expected {}", actual, expected)
            }
            Self::HandshakeTimeout { token, waited } => {
                write!(f, "no {:?} from device within {:?}", token, waited)
            }
            Self::Io(err) => write!(f, "serial i/o failed: {}", err),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LinkError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Read one token line, blocking until a newline or the deadline.
///
/// Bytes are accumulated until `\n`; undecodable bytes are dropped rather
/// than failing the read, and the result is whitespace-trimmed. Returns
/// `Ok(None)` when no complete line arrived before `timeout` elapsed.
pub fn read_line<S: SerialStream>(stream: &mut S, timeout: Duration) -> io::Result<Option<String>> {
    let deadline = Instant::now() + timeout;
    let mut buf = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        match stream.read_byte(remaining)? {
            Some(byte) => {
                buf.push(byte);
                if byte == b'\n' {
                    let text: String = String::from_utf8_lossy(&buf)
                        .chars()
                        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
                        .collect();
                    return Ok(Some(text.trim().to_string()));
                }
            }
            None => return Ok(None),
        }
    }
}

/// Wait for an exact token line within `timeout`.
///
/// Repeated bounded line reads against a wall-clock deadline; a line counts
/// only on exact equality with `token`. Anything else is logged at debug
/// level and discarded, never buffered for later.
pub fn wait_for<S: SerialStream>(
    stream: &mut S,
    token: &'static str,
    timeout: Duration,
) -> Result<(), LinkError> {
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let line = read_line(stream, remaining.min(LINE_TIMEOUT))?;
        let Some(line) = line else {
            continue;
        };
        log::debug!("device> {}", line);
        if line == token {
            return Ok(());
        }
    }

    Err(LinkError::HandshakeTimeout {
        token,
        waited: timeout,
    })
}

/// Read and discard device chatter for a bounded window.
///
/// Used to flush stale output before issuing a new command; discarded lines
/// are logged. I/O errors end the drain early and are swallowed, since the
/// following command will surface them anyway.
pub fn drain_lines<S: SerialStream>(stream: &mut S, window: Duration) {
    let deadline = Instant::now() + window;
    while Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match read_line(stream, remaining.min(Duration::from_millis(100))) {
            Ok(Some(line)) => log::debug!("device> {} (drained)", line),
            Ok(None) => {}
            Err(err) => {
                log::debug!("drain stopped: {}", err);
                return;
            }
        }
    }
}

/// Frame transfer configuration for one panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSender {
    /// Expected payload length; `send_frame` rejects anything else.
    pub frame_bytes: usize,
    /// Payload chunk size.
    pub chunk_size: usize,
    /// Pause after each flushed chunk so the receiver's buffer keeps up.
    pub chunk_pacing: Duration,
    /// Deadline for the device's `READY` after the length header.
    pub ready_timeout: Duration,
    /// Deadline for the device's `DONE` after the payload.
    pub done_timeout: Duration,
    /// Deadline for the device's `OK` after a pulse command.
    pub pulse_timeout: Duration,
}

impl Default for FrameSender {
    fn default() -> Self {
        Self::for_panel(&PanelSpec::default())
    }
}

impl FrameSender {
    /// Sender sized for `panel`.
    pub fn for_panel(panel: &PanelSpec) -> Self {
        Self {
            frame_bytes: panel.frame_bytes(),
            chunk_size: 256,
            chunk_pacing: Duration::from_millis(2),
            ready_timeout: Duration::from_secs(20),
            done_timeout: Duration::from_secs(20),
            pulse_timeout: Duration::from_secs(5),
        }
    }

    /// Send the standalone pulse command and wait for its ack.
    pub fn send_pulse<S: SerialStream>(&self, stream: &mut S) -> Result<(), LinkError> {
        stream.write_all(PULSE_COMMAND)?;
        stream.flush()?;
        wait_for(stream, TOKEN_OK, self.pulse_timeout)
    }

    /// Transfer one packed frame.
    ///
    /// Validates the payload length before any write, sends the 4-byte
    /// big-endian length header, waits for `READY`, streams the payload in
    /// fixed chunks with flush-and-pace after each, then waits for `DONE`.
    pub fn send_frame<S: SerialStream>(
        &self,
        stream: &mut S,
        payload: &[u8],
    ) -> Result<(), LinkError> {
        if payload.len() != self.frame_bytes {
            return Err(LinkError::PayloadSizeMismatch {
                actual: payload.len(),
                expected: self.frame_bytes,
            });
        }

        stream.write_all(&(payload.len() as u32).to_be_bytes())?;
        stream.flush()?;
        wait_for(stream, TOKEN_READY, self.ready_timeout)?;

        // chunk_size is a public knob; a zero never degrades into a panic
        for chunk in payload.chunks(self.chunk_size.max(1)) {
            stream.write_all(chunk)?;
            stream.flush()?;
            std::thread::sleep(self.chunk_pacing);
        }

        wait_for(stream, TOKEN_DONE, self.done_timeout)
    }
}
