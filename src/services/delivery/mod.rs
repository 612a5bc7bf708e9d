use crate::domain::delivery::DeliveryResult;
use crate::domain::message::OutboundMessage;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

pub mod policy;
pub mod transport;

use transport::{MailTransport, TransportError};

/// Attempts delivery of `message` through a single transport.
///
/// Errors, timeouts and panics inside the transport are all folded into
/// `DeliveryResult::Failed`.
#[tracing::instrument(skip(message, transport), fields(transport = transport.name()))]
pub async fn attempt(message: &OutboundMessage, transport: &dyn MailTransport, timeout: Duration) -> DeliveryResult {
    let send = AssertUnwindSafe(transport.send(message)).catch_unwind();

    match tokio::time::timeout(timeout, send).await {
        Ok(Ok(Ok(transport_id))) => {
            tracing::debug!(%transport_id, "Transport accepted message");
            DeliveryResult::Delivered { transport_id }
        }
        Ok(Ok(Err(e))) => {
            tracing::warn!(error = %e, "Transport rejected message");
            DeliveryResult::Failed { reason: e.to_string() }
        }
        Ok(Err(_)) => {
            tracing::error!("Transport panicked during send");
            DeliveryResult::Failed { reason: "Transport panicked during send".to_string() }
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "Transport timed out");
            DeliveryResult::Failed { reason: TransportError::Timeout(timeout).to_string() }
        }
    }
}
