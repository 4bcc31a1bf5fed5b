//! Unix domain socket transport for the devmux client.
//!
//! The device multiplexer daemon listens on a filesystem-path Unix socket
//! (`/var/run/usbmuxd` by convention). This crate provides the blocking
//! [`SocketStream`] that the framing and client layers read and write, plus
//! a [`Listener`] used by local daemon stubs and integration tests.

pub mod error;
pub mod listener;
pub mod socket;

pub use error::{Result, TransportError};
pub use listener::Listener;
pub use socket::{connect, SocketStream};
