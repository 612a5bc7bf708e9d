use crate::domain::message::OutboundMessage;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Rejected by server: {0}")]
    Rejected(String),
    #[error("Message could not be built: {0}")]
    Message(String),
    #[error("Transport error: {0}")]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Short label used in logs and metrics.
    fn name(&self) -> &str;

    /// Sends a message and returns the transport-assigned message id.
    ///
    /// # Errors
    /// Returns a `TransportError` describing why the message was not accepted.
    async fn send(&self, message: &OutboundMessage) -> Result<String, TransportError>;

    /// Verifies the transport is reachable without sending anything.
    ///
    /// # Errors
    /// Returns a `TransportError` if the server cannot be reached or refuses the session.
    async fn check(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
