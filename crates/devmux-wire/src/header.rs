use bytes::{BufMut, BytesMut};

use crate::error::{Result, WireError};

/// Size of the multiplexer frame header in bytes.
pub const MUX_HEADER_LEN: usize = 16;

/// Size of the lockdown frame header in bytes.
pub const LOCKDOWN_HEADER_LEN: usize = 4;

/// Protocol version carried in every multiplexer header.
pub const MUX_VERSION: u32 = 1;

/// Frame kind for property-list payloads, the only kind this client speaks.
pub const MUX_KIND_PLIST: u32 = 8;

/// Default maximum payload size: 1 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// A decoded frame header: how many payload bytes follow, and the tag that
/// correlates a reply with its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub payload_len: usize,
    pub tag: u32,
}

/// Header format in effect on a stream.
///
/// Multiplexer frames carry a 16-byte little-endian header whose length field
/// includes the header itself:
///
/// ```text
/// ┌────────────┬────────────┬────────────┬────────────┬──────────────────┐
/// │ Length     │ Version    │ Kind       │ Tag        │ Payload           │
/// │ (4B LE)    │ (4B LE)    │ (4B LE)    │ (4B LE)    │ (Length-16 bytes) │
/// └────────────┴────────────┴────────────┴────────────┴──────────────────┘
/// ```
///
/// Once a connection has been handed through to a device's lockdown service,
/// frames shrink to a 4-byte big-endian payload length with no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCodec {
    Mux,
    Lockdown,
}

impl HeaderCodec {
    /// Number of header bytes this codec reads and writes.
    pub fn header_len(&self) -> usize {
        match self {
            HeaderCodec::Mux => MUX_HEADER_LEN,
            HeaderCodec::Lockdown => LOCKDOWN_HEADER_LEN,
        }
    }

    /// Decode a header from `src`. The caller guarantees at least
    /// [`header_len`](Self::header_len) bytes.
    pub fn decode(&self, src: &[u8]) -> Result<FrameHeader> {
        match self {
            HeaderCodec::Mux => {
                let length = u32::from_le_bytes(src[0..4].try_into().unwrap());
                // Version is carried but not gated on.
                let _version = u32::from_le_bytes(src[4..8].try_into().unwrap());
                let kind = u32::from_le_bytes(src[8..12].try_into().unwrap());
                let tag = u32::from_le_bytes(src[12..16].try_into().unwrap());

                if (length as usize) < MUX_HEADER_LEN {
                    return Err(WireError::BadLength { length });
                }
                if kind != MUX_KIND_PLIST {
                    return Err(WireError::UnsupportedKind { kind });
                }

                Ok(FrameHeader {
                    payload_len: length as usize - MUX_HEADER_LEN,
                    tag,
                })
            }
            HeaderCodec::Lockdown => {
                let length = u32::from_be_bytes(src[0..4].try_into().unwrap());
                Ok(FrameHeader {
                    payload_len: length as usize,
                    tag: 0,
                })
            }
        }
    }

    /// Encode a header announcing `payload_len` payload bytes into `dst`.
    ///
    /// Lockdown framing has no tag field; the `tag` argument is ignored for
    /// that format.
    pub fn encode_header(&self, payload_len: usize, tag: u32, dst: &mut BytesMut) -> Result<()> {
        match self {
            HeaderCodec::Mux => {
                let total = match payload_len.checked_add(MUX_HEADER_LEN) {
                    Some(total) if total <= u32::MAX as usize => total,
                    _ => {
                        return Err(WireError::PayloadTooLarge {
                            size: payload_len,
                            max: u32::MAX as usize - MUX_HEADER_LEN,
                        })
                    }
                };
                dst.reserve(MUX_HEADER_LEN);
                dst.put_u32_le(total as u32);
                dst.put_u32_le(MUX_VERSION);
                dst.put_u32_le(MUX_KIND_PLIST);
                dst.put_u32_le(tag);
            }
            HeaderCodec::Lockdown => {
                if payload_len > u32::MAX as usize {
                    return Err(WireError::PayloadTooLarge {
                        size: payload_len,
                        max: u32::MAX as usize,
                    });
                }
                dst.reserve(LOCKDOWN_HEADER_LEN);
                dst.put_u32(payload_len as u32);
            }
        }
        Ok(())
    }
}
