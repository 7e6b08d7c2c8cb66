//! # tinymq
//!
//! `tinymq` is a minimal, in-memory publish/subscribe broker. Clients speak a
//! line-oriented text protocol over WebSockets: they subscribe to named
//! topics (optionally through `#` and `+` wildcards), publish into topics
//! they hold, and may leave a retained message that late subscribers receive.
//!
//! ## Core Modules
//!
//! - `broker`: topic registry, wildcard matching, routing and broadcast.
//! - `session`: per-connection state and the live session registry.
//! - `protocol`: command parsing, reply rendering and the per-connection state machine.
//! - `config`: layered configuration from `config/default.toml` and the environment.
//! - `transport`: the WebSocket server and the interactive client.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod config;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod utils;
