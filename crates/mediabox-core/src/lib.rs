//! # mediabox-core
//!
//! Shared library for the Mediabox remote containing the command line wire
//! format and the connection state types observed by the UI.
//!
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview
//!
//! The remote is a thin client: it opens one TCP connection to the media box
//! (port 2048) and writes one text command per line.  The box never answers.
//!
//! - **`protocol`** – How commands travel over the wire.  Each command is a
//!   UTF-8 string followed by a single `\n`.  The module validates commands
//!   before they are sent and decodes them on the receiving side.
//!
//! - **`domain`** – The connection state machine vocabulary
//!   (`Disconnected`, `Connecting`, `Connected`) and the `StateChange`
//!   notification payload.

pub mod domain;
pub mod protocol;

pub use domain::state::{ConnectionState, StateChange};
pub use protocol::line::{
    decode_command, encode_command, CommandRequest, LineDecoder, ProtocolError, DEFAULT_PORT,
    LINE_TERMINATOR, MAX_COMMAND_LEN,
};
