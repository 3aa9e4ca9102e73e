//! Domain types with no I/O: the connection state machine vocabulary.

pub mod state;
