//! Infrastructure layer for the remote.
//!
//! Contains the adapters behind the application-layer seams: the tokio TCP
//! link, configuration storage, and the command bridge a front end drives.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `mediabox_core`.  Non-test code in `application` MUST NOT import it; the
//! unit tests there use `network::mock` as their connector.
//!
//! # Sub-modules
//!
//! - **`network`** – `TcpConnector`/`TcpTransport`, the real link to the box,
//!   and a recording `MockConnector` for tests.
//!
//! - **`storage`** – TOML configuration file: port, connect timeout, last host.
//!
//! - **`ui_bridge`** – Command handlers returning serialisable DTOs, plus the
//!   line parser of the interactive shell.

pub mod network;
pub mod storage;
pub mod ui_bridge;
