use bytes::{BufMut, BytesMut};
use serde::Serialize;

use crate::error::{Result, WireError};
use crate::header::HeaderCodec;

/// Encode a multiplexer request frame: 16-byte header followed by the
/// message serialized as an XML property list. The daemon echoes `tag` in
/// its reply.
pub fn encode_mux<T: Serialize>(msg: &T, tag: u32) -> Result<BytesMut> {
    encode_with(HeaderCodec::Mux, msg, tag)
}

/// Encode a lockdown request frame: 4-byte big-endian payload length
/// followed by the XML property list. Lockdown framing carries no tag;
/// replies surface under tag 0.
pub fn encode_lockdown<T: Serialize>(msg: &T) -> Result<BytesMut> {
    encode_with(HeaderCodec::Lockdown, msg, 0)
}

fn encode_with<T: Serialize>(codec: HeaderCodec, msg: &T, tag: u32) -> Result<BytesMut> {
    let mut payload = Vec::new();
    plist::to_writer_xml(&mut payload, msg).map_err(WireError::Encode)?;

    let mut frame = BytesMut::with_capacity(codec.header_len() + payload.len());
    codec.encode_header(payload.len(), tag, &mut frame)?;
    frame.put_slice(&payload);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::StreamDecoder;
    use crate::header::{LOCKDOWN_HEADER_LEN, MUX_HEADER_LEN};
    use crate::message::MuxRequest;

    #[test]
    fn mux_frame_length_field_includes_header() {
        let frame = encode_mux(&MuxRequest::list_devices(), 0xbeef).unwrap();
        let declared = u32::from_le_bytes(frame[0..4].try_into().unwrap()) as usize;
        assert_eq!(declared, frame.len());
        assert!(frame.len() > MUX_HEADER_LEN, "payload must not be empty");
    }

    #[test]
    fn mux_frame_decodes_back() {
        let frame = encode_mux(&MuxRequest::list_devices(), 0xbeef).unwrap();

        let mut decoder = StreamDecoder::new(HeaderCodec::Mux);
        let envelopes = decoder.process(&frame).unwrap();
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].tag, 0xbeef);

        let dict = envelopes[0].body.as_dictionary().unwrap();
        assert_eq!(
            dict.get("MessageType").and_then(|v| v.as_string()),
            Some("ListDevices")
        );
    }

    #[test]
    fn mux_payload_is_xml() {
        let frame = encode_mux(&MuxRequest::list_devices(), 1).unwrap();
        let payload = &frame[MUX_HEADER_LEN..];
        assert!(payload.starts_with(b"<?xml"));
    }

    #[test]
    fn lockdown_frame_prefixes_big_endian_length() {
        let frame = encode_lockdown(&MuxRequest::list_devices()).unwrap();
        let declared = u32::from_be_bytes(frame[0..4].try_into().unwrap()) as usize;
        assert_eq!(declared, frame.len() - LOCKDOWN_HEADER_LEN);
    }

    #[test]
    fn unencodable_message_is_an_error_not_a_panic() {
        struct Unencodable;

        impl serde::Serialize for Unencodable {
            fn serialize<S: serde::Serializer>(
                &self,
                _serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("unencodable"))
            }
        }

        let err = encode_mux(&Unencodable, 0).unwrap_err();
        assert!(matches!(err, WireError::Encode(_)));
    }
}
