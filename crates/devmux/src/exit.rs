use std::fmt;
use std::io;

use devmux_client::ClientError;
use devmux_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => TRANSPORT_ERROR,
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    let code = match &err {
        ClientError::Transport(TransportError::PathTooLong { .. }) => USAGE,
        ClientError::Transport(TransportError::Bind { source, .. })
        | ClientError::Transport(TransportError::Connect { source, .. })
        | ClientError::Transport(TransportError::Accept(source))
        | ClientError::Transport(TransportError::Io(source)) => io_code(source),
        ClientError::Wire(_) => DATA_INVALID,
        ClientError::ListRequest(_) | ClientError::Reply(_) => DATA_INVALID,
        ClientError::ConnectionClosed | ClientError::RequestRefused { .. } => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}
