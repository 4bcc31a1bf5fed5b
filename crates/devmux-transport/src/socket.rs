use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
pub(crate) const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
pub(crate) const MAX_PATH_LEN: usize = 104;

pub(crate) fn validate_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

/// A connected socket stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// The underlying socket is closed when the stream is dropped.
pub struct SocketStream {
    inner: UnixStream,
}

/// Connect to a listening Unix domain socket (blocking).
pub fn connect(path: impl AsRef<Path>) -> Result<SocketStream> {
    let path = path.as_ref();
    validate_path_len(path)?;
    let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(?path, "connected to unix domain socket");
    Ok(SocketStream::from_unix(stream))
}

impl SocketStream {
    pub(crate) fn from_unix(stream: UnixStream) -> Self {
        Self { inner: stream }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_unix(cloned))
    }

    /// Shut down both halves of the stream.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }
}

impl Read for SocketStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SocketStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl From<UnixStream> for SocketStream {
    fn from(stream: UnixStream) -> Self {
        Self::from_unix(stream)
    }
}

impl std::fmt::Debug for SocketStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketStream")
            .field("type", &"unix")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_roundtrip() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut tx = SocketStream::from(left);
        let mut rx = SocketStream::from(right);

        tx.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        rx.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[test]
    fn try_clone_shares_the_socket() {
        let (left, right) = UnixStream::pair().unwrap();
        let tx = SocketStream::from(left);
        let mut rx = SocketStream::from(right);

        let mut cloned = tx.try_clone().unwrap();
        cloned.write_all(b"via-clone").unwrap();

        let mut buf = [0u8; 9];
        rx.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"via-clone");
    }

    #[test]
    fn shutdown_unblocks_reader() {
        let (left, right) = UnixStream::pair().unwrap();
        let tx = SocketStream::from(left);
        let mut rx = SocketStream::from(right);

        tx.shutdown().unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(rx.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn connect_rejects_overlong_path() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = connect(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    fn connect_missing_socket_fails() {
        let result = connect("/tmp/devmux-definitely-not-bound.sock");
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
