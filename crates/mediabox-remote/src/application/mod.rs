//! Application layer use cases for the remote.
//!
//! - **`connection_manager`** – Owns at most one link to the media box and
//!   the `Disconnected / Connecting / Connected` state machine around it.
//!
//! - **`command_channel`** – Writes one command line over the live link and
//!   converts write failures into a disconnect.
//!
//! - **`observer`** – State-change notification: a registry of weakly held
//!   observers invoked synchronously on every real transition.
//!
//! - **`transport`** – The seam to the network.  The manager only sees the
//!   [`transport::Connector`] and [`transport::Transport`] traits; the TCP
//!   implementation lives in the infrastructure layer.

pub mod command_channel;
pub mod connection_manager;
pub mod observer;
pub mod transport;
