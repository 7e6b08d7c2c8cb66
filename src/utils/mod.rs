//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `tinymq` application.
//!
//! It centralizes the error types shared by the broker, protocol and transport
//! layers, and the logging bootstrap.

pub mod error;
pub mod logging;

pub use error::{BrokerError, TransportError};
