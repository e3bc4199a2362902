use std::io;

#[derive(Debug)]
pub enum StreamError {
    InvalidKey(String),
    Io(io::Error),
    Frame(String),
    Handshake(String),
    /// The manager task is gone; commands can no longer be delivered.
    Stopped,
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::InvalidKey(msg) => write!(f, "invalid subscriber key: {msg}"),
            StreamError::Io(e) => write!(f, "transport I/O error: {e}"),
            StreamError::Frame(msg) => write!(f, "bad frame: {msg}"),
            StreamError::Handshake(msg) => write!(f, "handshake failed: {msg}"),
            StreamError::Stopped => write!(f, "notification stream stopped"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

/// An inbound frame that could not be turned into a [`super::Notification`].
#[derive(Debug)]
pub enum MessageError {
    Json(serde_json::Error),
    NotAnObject,
}

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageError::Json(e) => write!(f, "invalid JSON: {e}"),
            MessageError::NotAnObject => write!(f, "payload is not a JSON object"),
        }
    }
}

impl std::error::Error for MessageError {}
