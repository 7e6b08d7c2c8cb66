//! The `transport` module is responsible for handling network communication
//! with clients via WebSockets.
//!
//! It implements the WebSocket server, which accepts connections and hands
//! each one to the protocol state machine, and the interactive client used
//! from the command line.

pub mod client;
pub mod websocket;

pub use websocket::{serve, start_websocket_server};
