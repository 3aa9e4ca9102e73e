//! Line codec for the Mediabox remote-control protocol.
//!
//! Wire format:
//! ```text
//! [command:N bytes UTF-8][0x0A]
//! ```
//! One command per line, no header, no acknowledgement.  The box reads the
//! stream up to each `\n` and executes the text it finds.
//!
//! Because the newline is the only framing, a command must never contain a
//! line break of its own: `"PLAY\nSTOP"` would be executed as two commands.
//! [`CommandRequest::new`] rejects such input before it reaches a socket.

use thiserror::Error;
use tracing::warn;

/// TCP port the media box listens on for remote commands.
pub const DEFAULT_PORT: u16 = 2048;

/// Byte that terminates every command on the wire.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest command accepted, in bytes, excluding the terminator.
///
/// Matches the 1 KiB write buffer of the reference remote; the box reads
/// commands into a buffer of the same size.
pub const MAX_COMMAND_LEN: usize = 1024;

/// Errors that can occur while validating, encoding, or decoding a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The command text is empty.
    #[error("command is empty")]
    EmptyCommand,

    /// The command contains `\r` or `\n`, which would split it on the wire.
    #[error("command contains a line break at byte {position}")]
    EmbeddedLineBreak { position: usize },

    /// The command exceeds [`MAX_COMMAND_LEN`].
    #[error("command is {len} bytes long (max: {max})")]
    CommandTooLong { len: usize, max: usize },

    /// No line terminator has arrived yet.
    #[error("insufficient data: no line terminator in {available} bytes")]
    InsufficientData { available: usize },

    /// The line is not valid UTF-8.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// A single validated command line.
///
/// Ephemeral: built for one send and dropped when the send completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandRequest {
    text: String,
}

impl CommandRequest {
    /// Validates `text` as a single command.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EmptyCommand`], [`ProtocolError::EmbeddedLineBreak`]
    /// or [`ProtocolError::CommandTooLong`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mediabox_core::{CommandRequest, ProtocolError};
    ///
    /// assert!(CommandRequest::new("PLAY").is_ok());
    /// assert_eq!(
    ///     CommandRequest::new("PLAY\nSTOP"),
    ///     Err(ProtocolError::EmbeddedLineBreak { position: 4 })
    /// );
    /// ```
    pub fn new(text: impl Into<String>) -> Result<Self, ProtocolError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ProtocolError::EmptyCommand);
        }
        if let Some(position) = text.bytes().position(|b| b == b'\n' || b == b'\r') {
            return Err(ProtocolError::EmbeddedLineBreak { position });
        }
        if text.len() > MAX_COMMAND_LEN {
            return Err(ProtocolError::CommandTooLong {
                len: text.len(),
                max: MAX_COMMAND_LEN,
            });
        }
        Ok(Self { text })
    }

    /// Returns the command text without the terminator.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the request and returns the command text.
    pub fn into_inner(self) -> String {
        self.text
    }
}

impl std::fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<&str> for CommandRequest {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a command as UTF-8 bytes followed by a single `\n`.
///
/// # Examples
///
/// ```rust
/// use mediabox_core::{encode_command, CommandRequest};
///
/// let cmd = CommandRequest::new("PLAY").unwrap();
/// assert_eq!(encode_command(&cmd), b"PLAY\n");
/// ```
pub fn encode_command(cmd: &CommandRequest) -> Vec<u8> {
    let mut buf = Vec::with_capacity(cmd.text.len() + 1);
    buf.extend_from_slice(cmd.text.as_bytes());
    buf.push(LINE_TERMINATOR);
    buf
}

/// Decodes one command from the beginning of `bytes`.
///
/// Returns the command and the number of bytes consumed, terminator
/// included, so the caller can advance its read cursor.  A `\r` directly
/// before the terminator is stripped.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when no terminator is present
/// yet, [`ProtocolError::MalformedPayload`] for invalid UTF-8, or any
/// validation error from [`CommandRequest::new`].
pub fn decode_command(bytes: &[u8]) -> Result<(CommandRequest, usize), ProtocolError> {
    let end = bytes
        .iter()
        .position(|&b| b == LINE_TERMINATOR)
        .ok_or(ProtocolError::InsufficientData {
            available: bytes.len(),
        })?;

    let mut line = &bytes[..end];
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }

    let text = std::str::from_utf8(line)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    let cmd = CommandRequest::new(text)?;
    Ok((cmd, end + 1))
}

// ── Streaming decoder ─────────────────────────────────────────────────────────

/// Accumulates bytes from a stream and yields complete commands.
///
/// TCP may deliver half a line or several lines in one read.  `LineDecoder`
/// keeps the partial tail between calls to [`LineDecoder::push`].
/// Lines that fail to decode are skipped with a warning.
///
/// The tail never exceeds [`MAX_COMMAND_LEN`] + 1 bytes (a full command and
/// a `\r`).  A longer unterminated line is dropped, along with everything up
/// to its terminator whenever that arrives.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
    // Inside an over-long line; bytes are dropped until the next terminator.
    discarding: bool,
}

impl LineDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every command completed by them.
    pub fn push(&mut self, mut bytes: &[u8]) -> Vec<CommandRequest> {
        if self.discarding {
            match bytes.iter().position(|&b| b == LINE_TERMINATOR) {
                Some(end) => {
                    bytes = &bytes[end + 1..];
                    self.discarding = false;
                }
                None => return Vec::new(),
            }
        }
        self.buf.extend_from_slice(bytes);

        let mut out = Vec::new();
        let mut cursor = 0;
        loop {
            match decode_command(&self.buf[cursor..]) {
                Ok((cmd, consumed)) => {
                    out.push(cmd);
                    cursor += consumed;
                }
                Err(ProtocolError::InsufficientData { .. }) => break,
                Err(e) => {
                    warn!("skipping undecodable command line: {e}");
                    // The line is bad but its terminator is known to be there.
                    match self.buf[cursor..].iter().position(|&b| b == LINE_TERMINATOR) {
                        Some(end) => cursor += end + 1,
                        None => break,
                    }
                }
            }
        }
        self.buf.drain(..cursor);

        if self.buf.len() > MAX_COMMAND_LEN + 1 {
            warn!(
                "discarding unterminated line of {} bytes (max: {MAX_COMMAND_LEN})",
                self.buf.len()
            );
            self.buf.clear();
            self.discarding = true;
        }
        out
    }

    /// Number of buffered bytes not yet forming a complete line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_command_appends_single_newline() {
        let cmd = CommandRequest::new("PLAY").unwrap();
        assert_eq!(encode_command(&cmd), b"PLAY\n".to_vec());
    }

    #[test]
    fn test_encode_command_keeps_utf8_bytes() {
        let cmd = CommandRequest::new("OSD Café").unwrap();
        let bytes = encode_command(&cmd);
        assert_eq!(&bytes[..bytes.len() - 1], "OSD Café".as_bytes());
        assert_eq!(*bytes.last().unwrap(), LINE_TERMINATOR);
    }

    #[test]
    fn test_new_rejects_empty_command() {
        assert_eq!(CommandRequest::new(""), Err(ProtocolError::EmptyCommand));
    }

    #[test]
    fn test_new_rejects_embedded_newline_with_position() {
        let result = CommandRequest::new("VOL+\nVOL+");
        assert_eq!(result, Err(ProtocolError::EmbeddedLineBreak { position: 4 }));
    }

    #[test]
    fn test_new_rejects_carriage_return() {
        let result = CommandRequest::new("STOP\r");
        assert!(matches!(result, Err(ProtocolError::EmbeddedLineBreak { .. })));
    }

    #[test]
    fn test_new_accepts_command_at_max_length() {
        let text = "A".repeat(MAX_COMMAND_LEN);
        assert!(CommandRequest::new(text).is_ok());
    }

    #[test]
    fn test_new_rejects_command_over_max_length() {
        let text = "A".repeat(MAX_COMMAND_LEN + 1);
        assert_eq!(
            CommandRequest::new(text),
            Err(ProtocolError::CommandTooLong {
                len: MAX_COMMAND_LEN + 1,
                max: MAX_COMMAND_LEN
            })
        );
    }

    #[test]
    fn test_decode_command_reports_consumed_bytes() {
        let (cmd, consumed) = decode_command(b"PLAY\nSTOP\n").unwrap();
        assert_eq!(cmd.as_str(), "PLAY");
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_decode_command_strips_carriage_return() {
        let (cmd, consumed) = decode_command(b"PAUSE\r\n").unwrap();
        assert_eq!(cmd.as_str(), "PAUSE");
        assert_eq!(consumed, 7);
    }

    #[test]
    fn test_decode_command_without_terminator_is_insufficient() {
        let result = decode_command(b"PLA");
        assert_eq!(result, Err(ProtocolError::InsufficientData { available: 3 }));
    }

    #[test]
    fn test_decode_command_invalid_utf8_is_malformed() {
        let result = decode_command(&[0xFF, 0xFE, b'\n']);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_line_decoder_joins_split_reads() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"ST").is_empty());
        assert_eq!(decoder.pending(), 2);

        let cmds = decoder.push(b"OP\nPL");

        assert_eq!(cmds, vec![CommandRequest::new("STOP").unwrap()]);
        assert_eq!(decoder.pending(), 2);
    }

    #[test]
    fn test_line_decoder_bounds_unterminated_line() {
        // Arrange
        let mut decoder = LineDecoder::new();
        let chunk = vec![b'A'; 1000];

        // Act
        for _ in 0..100 {
            assert!(decoder.push(&chunk).is_empty());
            assert!(decoder.pending() <= MAX_COMMAND_LEN + 1);
        }
        let cmds = decoder.push(b"AAAA\nPLAY\n");

        // Assert – the over-long line is dropped, the next one survives
        assert_eq!(cmds, vec![CommandRequest::new("PLAY").unwrap()]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_line_decoder_keeps_max_length_line_split_across_reads() {
        let mut decoder = LineDecoder::new();
        let text = "B".repeat(MAX_COMMAND_LEN);

        assert!(decoder.push(text.as_bytes()).is_empty());
        assert!(decoder.push(b"\r").is_empty());
        let cmds = decoder.push(b"\n");

        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].as_str().len(), MAX_COMMAND_LEN);
    }

    #[test]
    fn test_line_decoder_yields_coalesced_lines_in_order() {
        let mut decoder = LineDecoder::new();
        let cmds = decoder.push(b"UP\nDOWN\nENTER\n");
        let texts: Vec<&str> = cmds.iter().map(CommandRequest::as_str).collect();
        assert_eq!(texts, ["UP", "DOWN", "ENTER"]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_line_decoder_skips_blank_and_invalid_lines() {
        let mut decoder = LineDecoder::new();
        let cmds = decoder.push(b"\n\xFF\nBACK\n");
        assert_eq!(cmds, vec![CommandRequest::new("BACK").unwrap()]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_command_request_display_is_raw_text() {
        let cmd = CommandRequest::try_from("MENU").unwrap();
        assert_eq!(cmd.to_string(), "MENU");
        assert_eq!(cmd.into_inner(), "MENU");
    }
}
