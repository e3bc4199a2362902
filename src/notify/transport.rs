use std::fmt;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::debug;

use crate::limits::{MAX_FRAME_LEN, MAX_SUBSCRIBER_KEY_LEN};

use super::StreamError;

/// Whose stream a connection carries: an end user, a worker, or a role such as `manager`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberKey(String);

impl SubscriberKey {
    /// Validates that the key can travel as a query parameter unescaped.
    pub fn new(key: impl Into<String>) -> Result<Self, StreamError> {
        let key = key.into();
        if key.is_empty() {
            return Err(StreamError::InvalidKey("empty".into()));
        }
        if key.len() > MAX_SUBSCRIBER_KEY_LEN {
            return Err(StreamError::InvalidKey("too long".into()));
        }
        if let Some(c) = key
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '&' | '#' | '?' | '%' | '=' | '/'))
        {
            return Err(StreamError::InvalidKey(format!("character {c:?} not allowed")));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Close status sent when the client ends a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    Normal,
    GoingAway,
}

impl CloseCode {
    pub fn code(self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
        }
    }
}

/// One open stream of inbound text frames.
#[async_trait]
pub trait Connection: Send {
    /// Next frame; `None` once the peer has closed the stream.
    async fn next_frame(&mut self) -> Option<Result<String, StreamError>>;

    async fn close(&mut self, code: CloseCode);
}

/// Opens connections scoped to a subscriber key.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn open(&self, key: &SubscriberKey) -> Result<Box<dyn Connection>, StreamError>;
}

fn codec_error(e: LinesCodecError) -> StreamError {
    match e {
        LinesCodecError::Io(e) => StreamError::Io(e),
        other => StreamError::Frame(other.to_string()),
    }
}

/// Newline-delimited frames over TCP.
///
/// After connecting, the client sends one handshake line
/// `GET <path>?user_id=<key>` and from then on only reads.
#[derive(Debug, Clone)]
pub struct TcpLineTransport {
    endpoint: String,
    path: String,
}

impl TcpLineTransport {
    pub fn new(endpoint: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            path: path.into(),
        }
    }

    pub fn handshake(&self, key: &SubscriberKey) -> String {
        format!("GET {}?user_id={}", self.path, key)
    }
}

struct TcpLineConnection {
    framed: Framed<TcpStream, LinesCodec>,
}

#[async_trait]
impl Transport for TcpLineTransport {
    async fn open(&self, key: &SubscriberKey) -> Result<Box<dyn Connection>, StreamError> {
        let stream = TcpStream::connect(&self.endpoint).await?;
        stream.set_nodelay(true)?;
        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LEN));
        framed
            .send(self.handshake(key))
            .await
            .map_err(|e| StreamError::Handshake(e.to_string()))?;
        Ok(Box::new(TcpLineConnection { framed }))
    }
}

#[async_trait]
impl Connection for TcpLineConnection {
    async fn next_frame(&mut self) -> Option<Result<String, StreamError>> {
        self.framed.next().await.map(|r| r.map_err(codec_error))
    }

    async fn close(&mut self, code: CloseCode) {
        debug!("closing line connection with code {}", code.code());
        if let Err(e) = self.framed.get_mut().shutdown().await {
            debug!("shutdown after close: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(SubscriberKey::new("17").is_ok());
        assert!(SubscriberKey::new("manager").is_ok());
        assert!(SubscriberKey::new("lead@example.com").is_ok());
        assert!(SubscriberKey::new("").is_err());
        assert!(SubscriberKey::new("a b").is_err());
        assert!(SubscriberKey::new("a&user_id=b").is_err());
        assert!(SubscriberKey::new("x".repeat(MAX_SUBSCRIBER_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn handshake_carries_key_as_query() {
        let t = TcpLineTransport::new("127.0.0.1:1", "/api/v1/notifications/ws");
        let key = SubscriberKey::new("17").unwrap();
        assert_eq!(t.handshake(&key), "GET /api/v1/notifications/ws?user_id=17");
    }

    #[test]
    fn close_codes() {
        assert_eq!(CloseCode::Normal.code(), 1000);
        assert_eq!(CloseCode::GoingAway.code(), 1001);
    }
}
