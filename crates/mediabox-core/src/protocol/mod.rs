//! Protocol module containing the newline-terminated command codec.

pub mod line;

pub use line::{decode_command, encode_command, CommandRequest, LineDecoder, ProtocolError};
