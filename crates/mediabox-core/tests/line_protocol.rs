//! Integration tests for the mediabox-core line protocol.
//!
//! These tests drive the public API the way the two ends of the link use it:
//! the remote encodes validated commands, the box feeds whatever the socket
//! returned into a [`LineDecoder`].

use mediabox_core::{
    decode_command, encode_command, CommandRequest, LineDecoder, ProtocolError, DEFAULT_PORT,
};

#[test]
fn test_default_port_is_2048() {
    assert_eq!(DEFAULT_PORT, 2048);
}

#[test]
fn test_encoded_stream_decodes_one_byte_at_a_time() {
    // Arrange: three commands written back to back, as the remote would.
    let mut wire = Vec::new();
    for text in ["PLAY", "VOLUME 40", "STOP"] {
        wire.extend(encode_command(&CommandRequest::new(text).unwrap()));
    }

    // Act: the worst case for framing, every read returns a single byte.
    let mut decoder = LineDecoder::new();
    let mut received = Vec::new();
    for byte in &wire {
        received.extend(decoder.push(std::slice::from_ref(byte)));
    }

    // Assert
    let texts: Vec<String> = received.into_iter().map(CommandRequest::into_inner).collect();
    assert_eq!(texts, ["PLAY", "VOLUME 40", "STOP"]);
    assert_eq!(decoder.pending(), 0);
}

#[test]
fn test_windows_line_endings_decode_like_unix_ones() {
    let (unix, _) = decode_command(b"MENU\n").unwrap();
    let (windows, _) = decode_command(b"MENU\r\n").unwrap();
    assert_eq!(unix, windows);
}

#[test]
fn test_multiline_input_never_reaches_the_encoder() {
    // A command with an embedded newline would be executed as two commands.
    let err = CommandRequest::new("PLAY\nRM -RF").unwrap_err();
    assert_eq!(err, ProtocolError::EmbeddedLineBreak { position: 4 });
}
