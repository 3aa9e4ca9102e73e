//! Network infrastructure for the remote.
//!
//! # Sub-modules
//!
//! - **`tcp`** – Opens the TCP link to the media box and writes command lines
//!   to it.  Detects a peer that has closed its end before each write.
//!
//! - **`mock`** – In-memory connector that records every line written and can
//!   be told to fail opens or writes.

pub mod mock;
pub mod tcp;

pub use mock::{MockConnector, MockWire};
pub use tcp::{TcpConnector, TcpTransport};
