//! Newline-delimited line codec.
//!
//! Wire format, both directions:
//! ```text
//! request:  <command>\n
//! reply:    <headline>\n<json>\n
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines.  A
//! single socket read may carry part of a line, exactly one, or several
//! concatenated, so every complete line in the input is handed to the
//! callback in order.

use heapless::Vec;

/// Longest accepted command line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 128;

/// Why a line could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// The line exceeded [`MAX_LINE_LEN`]; its bytes were discarded.
    TooLong,
    /// The line was not valid UTF-8.
    NotUtf8,
}

impl core::fmt::Display for LineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooLong => write!(f, "line longer than {MAX_LINE_LEN} bytes"),
            Self::NotUtf8 => write!(f, "line is not valid UTF-8"),
        }
    }
}

enum DecoderState {
    /// Collecting bytes of the current line.
    Collecting,
    /// Current line overflowed; skip to the next terminator.
    Discarding,
}

/// Streaming line decoder.
pub struct LineDecoder {
    state: DecoderState,
    buf: Vec<u8, MAX_LINE_LEN>,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting,
            buf: Vec::new(),
        }
    }

    /// Feed bytes into the decoder, calling `on_line` once per complete
    /// line (terminator stripped, `\r` included if the peer sent one).
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(Result<&str, LineError>)) {
        for &byte in data {
            match self.state {
                DecoderState::Collecting if byte == b'\n' => {
                    match core::str::from_utf8(&self.buf) {
                        Ok(line) => on_line(Ok(line)),
                        Err(_) => on_line(Err(LineError::NotUtf8)),
                    }
                    self.buf.clear();
                }
                DecoderState::Collecting => {
                    if self.buf.push(byte).is_err() {
                        self.buf.clear();
                        self.state = DecoderState::Discarding;
                    }
                }
                DecoderState::Discarding if byte == b'\n' => {
                    on_line(Err(LineError::TooLong));
                    self.state = DecoderState::Collecting;
                }
                DecoderState::Discarding => {}
            }
        }
    }

    /// Bytes of the unfinished line held so far.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
