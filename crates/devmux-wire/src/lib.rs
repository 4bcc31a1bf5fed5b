//! Wire protocol for the device multiplexer daemon and the lockdown
//! side channel.
//!
//! Every message is a property-list payload behind a fixed-size binary
//! header. Two header formats exist on the same connection lifecycle:
//! - Multiplexer frames: 16-byte little-endian header carrying a length
//!   (inclusive of the header), a version, a frame kind, and a correlation
//!   tag echoed by replies.
//! - Lockdown frames: once a connection has been handed through to a
//!   device, a bare 4-byte big-endian payload length.
//!
//! [`StreamDecoder`] turns an arbitrarily fragmented byte stream into
//! parsed [`Envelope`]s; the `encode_*` functions build outbound frames.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod header;
pub mod message;

pub use decoder::{DecoderConfig, Envelope, StreamDecoder};
pub use encoder::{encode_lockdown, encode_mux};
pub use error::{Result, WireError};
pub use header::{
    FrameHeader, HeaderCodec, DEFAULT_MAX_PAYLOAD, LOCKDOWN_HEADER_LEN, MUX_HEADER_LEN,
    MUX_KIND_PLIST, MUX_VERSION,
};
pub use message::{
    ConnectRequest, DetachRecord, DeviceListResponse, DeviceProperties, DeviceRecord, MessageKind,
    MuxRequest, PropertyQuery, PropertyReply, ResultRecord, LOCKDOWN_PORT, MSG_ATTACHED,
    MSG_DETACHED, MSG_RESULT, TAG_CONNECT, TAG_LISTEN, TAG_LIST_DEVICES, TAG_SIDE_CHANNEL,
};
