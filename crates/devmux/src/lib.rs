//! Client library and CLI for a usbmuxd-compatible device multiplexer.
//!
//! devmux talks to the device daemon over its unix socket: it enumerates
//! attached devices, resolves their names over lockdown side channels, and
//! streams attach/detach notifications.
//!
//! # Crate Structure
//!
//! - [`transport`] — Unix-domain-socket plumbing (connect, listener)
//! - [`wire`] — Frame header codecs, the stream decoder, and typed messages
//! - [`client`] — Response routing, enumeration, and notification workflows

/// Re-export transport types.
pub mod transport {
    pub use devmux_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use devmux_wire::*;
}

/// Re-export client types.
pub mod client {
    pub use devmux_client::*;
}
