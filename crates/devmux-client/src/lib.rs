//! Client workflows for a device-multiplexing daemon.
//!
//! Builds on [`devmux_transport`] for socket plumbing and [`devmux_wire`]
//! for framing. The pieces layer up: a [`Connection`] pumps decoded frames
//! into a tag-keyed [`ResponseRouter`], the [`DeviceEnumerator`] drives the
//! list-then-name workflow over it, and the [`NotificationListener`] turns
//! a listen subscription into a blocking iterator of [`DeviceEvent`]s.

pub mod connection;
pub mod enumerate;
pub mod error;
pub mod listener;
pub mod router;

pub use connection::{ClientConfig, Connection, DEFAULT_SOCKET_PATH};
pub use enumerate::{DeviceDescriptor, DeviceEnumerator, EnumerateMode};
pub use error::{ClientError, Result};
pub use listener::{DeviceEvent, NotificationListener, Notifications};
pub use router::{Reply, ReplyError, ReplyShape, ResponseRouter, Routed};
