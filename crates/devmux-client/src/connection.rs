use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use devmux_transport::SocketStream;
use devmux_wire::{
    encode_lockdown, encode_mux, DecoderConfig, Envelope, HeaderCodec, StreamDecoder,
    DEFAULT_MAX_PAYLOAD,
};

use crate::error::{ClientError, Result};
use crate::router::ResponseRouter;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Conventional path of the daemon's listening socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/usbmuxd";

/// Client-wide connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Path of the daemon's Unix socket.
    pub socket_path: PathBuf,
    /// Read/write timeout applied to each socket. `None` blocks forever.
    pub io_timeout: Option<Duration>,
    /// Maximum accepted payload size per frame.
    pub max_payload_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            io_timeout: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// One connection to the daemon: a socket plus the framing decoder that owns
/// its inbound bytes. Dropping the connection closes the socket.
#[derive(Debug)]
pub struct Connection {
    stream: SocketStream,
    decoder: StreamDecoder,
}

impl Connection {
    /// Connect to the daemon and set up multiplexer framing.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let stream = devmux_transport::connect(&config.socket_path)?;
        Self::from_stream(stream, config)
    }

    /// Wrap an already-connected stream (socket pairs, daemon stubs).
    pub fn from_stream(stream: SocketStream, config: &ClientConfig) -> Result<Self> {
        stream.set_read_timeout(config.io_timeout)?;
        stream.set_write_timeout(config.io_timeout)?;
        let decoder = StreamDecoder::with_config(
            HeaderCodec::Mux,
            DecoderConfig {
                max_payload_size: config.max_payload_size,
            },
        );
        Ok(Self { stream, decoder })
    }

    /// Send a multiplexer request under `tag`.
    pub fn send<T: Serialize>(&mut self, msg: &T, tag: u32) -> Result<()> {
        let frame = encode_mux(msg, tag)?;
        debug!(tag, len = frame.len(), "sending request");
        self.write_all_retrying(&frame)
    }

    /// Send a lockdown request. Lockdown framing has no tag; the reply
    /// surfaces under tag 0.
    pub fn send_lockdown<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        let frame = encode_lockdown(msg)?;
        debug!(len = frame.len(), "sending lockdown request");
        self.write_all_retrying(&frame)
    }

    /// Read one chunk from the socket and return the frames it completes.
    ///
    /// Blocks until the daemon sends something (or a configured timeout
    /// fires). EOF is [`ClientError::ConnectionClosed`].
    pub fn read_envelopes(&mut self) -> Result<Vec<Envelope>> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = loop {
            match self.stream.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ClientError::Transport(err.into())),
            }
        };

        if read == 0 {
            return Err(ClientError::ConnectionClosed);
        }

        Ok(self.decoder.process(&chunk[..read])?)
    }

    /// Read one chunk and route every frame it completes, in arrival order.
    pub fn pump<C>(&mut self, router: &mut ResponseRouter<C>, ctx: &mut C) -> Result<()> {
        for envelope in self.read_envelopes()? {
            router.route(ctx, envelope.tag, &envelope.body);
        }
        Ok(())
    }

    /// Swap the stream to lockdown framing after a successful
    /// through-connect. Legal only between frames.
    pub fn switch_to_lockdown(&mut self) -> Result<()> {
        self.decoder.set_codec(HeaderCodec::Lockdown)?;
        debug!("stream handed through; lockdown framing in effect");
        Ok(())
    }

    /// The framing decoder owning this connection's inbound bytes.
    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }

    fn write_all_retrying(&mut self, frame: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < frame.len() {
            match self.stream.write(&frame[offset..]) {
                Ok(0) => return Err(ClientError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ClientError::Transport(err.into())),
            }
        }
        loop {
            match self.stream.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ClientError::Transport(err.into())),
            }
        }
    }
}
