use crate::router::ReplyError;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] devmux_transport::TransportError),

    /// Framing or payload parsing failed; the stream is poisoned.
    #[error("wire error: {0}")]
    Wire(#[from] devmux_wire::WireError),

    /// The daemon closed the connection mid-operation.
    #[error("connection closed by the daemon")]
    ConnectionClosed,

    /// The device-list reply did not decode as a device list.
    #[error("device list request failed: {0}")]
    ListRequest(#[source] ReplyError),

    /// The daemon refused a request with a nonzero result code.
    #[error("request refused by the daemon (result {code})")]
    RequestRefused { code: i64 },

    /// A reply failed to decode into its expected shape.
    #[error("reply decode failed: {0}")]
    Reply(#[from] ReplyError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
