//! The `protocol` module implements the text command protocol spoken by clients.
//!
//! It defines the inbound command grammar (`command`), the rendering of broker
//! outcomes into replies (`reply`), and the per-connection state machine that
//! performs the connect/disconnect handshakes and feeds commands to the broker
//! (`handler`).

pub mod command;
pub mod handler;
pub mod reply;

pub use command::Command;
pub use handler::{Inbound, SessionWorker, run_session};

#[cfg(test)]
mod tests;
