/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The frame header declares a length shorter than the header itself.
    #[error("frame length {length} is shorter than its own header")]
    BadLength { length: u32 },

    /// The frame kind is not the property-list kind this client speaks.
    #[error("unsupported frame kind {kind} (expected property-list frames)")]
    UnsupportedKind { kind: u32 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload is not a parseable property list.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[source] plist::Error),

    /// A message could not be serialized into a property list.
    #[error("failed to encode message: {0}")]
    Encode(#[source] plist::Error),

    /// The header format was swapped while a frame was in flight.
    #[error("codec swap attempted mid-frame")]
    SwapMidFrame,

    /// The decoder halted after an earlier failure on this stream.
    #[error("decoder halted by a previous framing failure")]
    Halted,
}

pub type Result<T> = std::result::Result<T, WireError>;
