use bytes::BytesMut;
use tracing::warn;

use crate::error::{Result, WireError};
use crate::header::{HeaderCodec, DEFAULT_MAX_PAYLOAD};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Configuration for the stream decoder.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum payload size in bytes. Default: 1 MiB.
    pub max_payload_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// One decoded frame: the correlation tag and the parsed payload.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub tag: u32,
    pub body: plist::Value,
}

#[derive(Debug, Clone, Copy)]
enum DecodeState {
    /// Waiting for enough bytes to decode the next header.
    ReadingHeader,
    /// Header decoded; waiting for the full payload.
    ReadingPayload { payload_len: usize, tag: u32 },
    /// A framing or parse failure poisoned the stream.
    Failed,
}

/// Incremental frame decoder over an append-only byte buffer.
///
/// Input arrives in arbitrary fragments; [`process`](Self::process) appends
/// it and drains every frame it completes, parsing each payload as a
/// property list. Partial frames wait for more input. Any framing or parse
/// failure is terminal: the decoder halts and rejects all further input,
/// since a stream that has lost framing cannot be resynchronized.
#[derive(Debug)]
pub struct StreamDecoder {
    codec: HeaderCodec,
    buf: BytesMut,
    pos: usize,
    state: DecodeState,
    config: DecoderConfig,
}

impl StreamDecoder {
    /// Create a decoder with default configuration.
    pub fn new(codec: HeaderCodec) -> Self {
        Self::with_config(codec, DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(codec: HeaderCodec, config: DecoderConfig) -> Self {
        Self {
            codec,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            pos: 0,
            state: DecodeState::ReadingHeader,
            config,
        }
    }

    /// Append `input` and drain every frame it completes, in arrival order.
    ///
    /// An error poisons the decoder: the failing frame is not delivered and
    /// every later call returns [`WireError::Halted`] without consuming its
    /// input.
    pub fn process(&mut self, input: &[u8]) -> Result<Vec<Envelope>> {
        if self.is_failed() {
            return Err(WireError::Halted);
        }

        self.buf.extend_from_slice(input);
        let mut drained = Vec::new();

        loop {
            match self.state {
                DecodeState::ReadingHeader => {
                    let header_len = self.codec.header_len();
                    if self.pending() < header_len {
                        break;
                    }
                    let header = match self.codec.decode(&self.buf[self.pos..self.pos + header_len])
                    {
                        Ok(header) => header,
                        Err(err) => return Err(self.fail(err)),
                    };
                    if header.payload_len > self.config.max_payload_size {
                        return Err(self.fail(WireError::PayloadTooLarge {
                            size: header.payload_len,
                            max: self.config.max_payload_size,
                        }));
                    }
                    self.pos += header_len;
                    self.state = DecodeState::ReadingPayload {
                        payload_len: header.payload_len,
                        tag: header.tag,
                    };
                }
                DecodeState::ReadingPayload { payload_len, tag } => {
                    if self.pending() < payload_len {
                        break;
                    }
                    let payload = &self.buf[self.pos..self.pos + payload_len];
                    let body: plist::Value = match plist::from_bytes(payload) {
                        Ok(body) => body,
                        Err(err) => return Err(self.fail(WireError::MalformedPayload(err))),
                    };
                    self.pos += payload_len;
                    self.state = DecodeState::ReadingHeader;
                    drained.push(Envelope { tag, body });
                }
                DecodeState::Failed => return Err(WireError::Halted),
            }
        }

        // Reclaim the buffer only once everything in it has been consumed;
        // frames ending mid-buffer just advance the position.
        if self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        }

        Ok(drained)
    }

    /// Swap the header format. Legal only between frames, with nothing
    /// buffered under the old format.
    pub fn set_codec(&mut self, codec: HeaderCodec) -> Result<()> {
        match self.state {
            DecodeState::Failed => Err(WireError::Halted),
            DecodeState::ReadingHeader if self.pending() == 0 => {
                self.codec = codec;
                Ok(())
            }
            _ => Err(WireError::SwapMidFrame),
        }
    }

    /// The header format currently in effect.
    pub fn codec(&self) -> HeaderCodec {
        self.codec
    }

    /// Bytes buffered but not yet consumed by a complete frame.
    pub fn buffered(&self) -> usize {
        self.pending()
    }

    /// True once a failure has poisoned the decoder.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, DecodeState::Failed)
    }

    fn pending(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn fail(&mut self, err: WireError) -> WireError {
        warn!(error = %err, "frame decoder halted");
        self.state = DecodeState::Failed;
        err
    }
}
