//! mediabox-remote library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does mediabox-remote do?
//!
//! The remote keeps one TCP connection to a media box and turns button
//! presses into text commands, one per line:
//!
//! 1. The UI collects a host address and calls
//!    [`ConnectionManager::connect`](application::connection_manager::ConnectionManager::connect).
//! 2. When the link comes up, registered observers are told, and the UI
//!    enables its command buttons.
//! 3. Each button calls
//!    [`CommandChannel::send`](application::command_channel::CommandChannel::send),
//!    which writes `COMMAND\n` and flushes.
//! 4. If a write fails the manager drops the link and observers are told
//!    again, so the UI can disable its buttons.  The user reconnects by hand.

/// Application layer: connection lifecycle and command dispatch.
pub mod application;

/// Infrastructure layer: TCP sockets, config storage, and the UI bridge.
pub mod infrastructure;
