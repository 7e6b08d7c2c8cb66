//! The `session` module defines the server-side representation of a connected client.
//!
//! A [`Session`] owns its transport sender and its own subscription set; the
//! [`SessionRegistry`] owns every live session, keyed by identity. Subscription
//! state therefore lives with the session it belongs to and disappears with it.

pub mod handle;
pub mod registry;

pub use handle::{Session, SessionId};
pub use registry::SessionRegistry;
