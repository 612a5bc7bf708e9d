use crate::domain::delivery::{DeliveryMethod, DeliveryResult, PolicyEntry, SubmissionOutcome};
use crate::domain::message::OutboundMessage;
use crate::domain::request_log::LogEndpoint;
use crate::services::delivery::attempt;
use crate::services::delivery::transport::MailTransport;
use crate::services::request_log::RequestLog;
use lettre::Address;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

pub const URGENT_COPY_PREFIX: &str = "[URGENT COPY] ";
pub const ADMIN_ONLY_NOTE: &str = "Email sent to admin only";
pub const MOCKED_NOTE: &str = "Mock success response despite email failure";

#[derive(Clone, Debug)]
struct Metrics {
    attempts_total: Counter<u64>,
    outcomes_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("formrelay-server");
        Self {
            attempts_total: meter
                .u64_counter("formrelay_delivery_attempts_total")
                .with_description("Delivery attempts per transport and result")
                .build(),
            outcomes_total: meter
                .u64_counter("formrelay_delivery_outcomes_total")
                .with_description("Completed delivery runs by the method that produced the result")
                .build(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TryPrimary,
    TrySecondary,
    TryAdminOnly,
}

/// Sequences delivery attempts: primary, then secondary, then an urgent copy
/// to the operational mailbox, and finally a synthetic success.
///
/// A run always terminates with `accepted == true` after at most three
/// attempts. Transport failures are logged, never returned.
#[derive(Clone, Debug)]
pub struct DeliveryPolicy {
    primary: Arc<dyn MailTransport>,
    secondary: Option<Arc<dyn MailTransport>>,
    operations_address: Address,
    attempt_timeout: Duration,
    log: RequestLog,
    metrics: Metrics,
}

impl DeliveryPolicy {
    #[must_use]
    pub fn new(
        primary: Arc<dyn MailTransport>,
        secondary: Option<Arc<dyn MailTransport>>,
        operations_address: Address,
        attempt_timeout: Duration,
        log: RequestLog,
    ) -> Self {
        Self { primary, secondary, operations_address, attempt_timeout, log, metrics: Metrics::new() }
    }

    #[must_use]
    pub fn primary(&self) -> &Arc<dyn MailTransport> {
        &self.primary
    }

    #[must_use]
    pub const fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Delivers `message`, entering the fallback sequence at `entry`.
    #[tracing::instrument(skip(self, message), fields(to = %message.to_display(), method = tracing::field::Empty))]
    pub async fn deliver(&self, message: &OutboundMessage, entry: PolicyEntry, endpoint: LogEndpoint) -> SubmissionOutcome {
        let mut stage = match entry {
            PolicyEntry::Primary => Stage::TryPrimary,
            PolicyEntry::Secondary => Stage::TrySecondary,
        };
        let mut attempts = 0u8;

        let outcome = loop {
            attempts += 1;
            match stage {
                Stage::TryPrimary => {
                    self.log
                        .info(
                            endpoint,
                            format!("Attempting to send email to: {}, subject: {}", message.to_display(), message.subject()),
                        )
                        .await;

                    match self.try_transport(self.primary.as_ref(), message).await {
                        DeliveryResult::Delivered { transport_id } => {
                            self.log.info(endpoint, format!("Email sent successfully: {transport_id}")).await;
                            break Self::done(DeliveryMethod::Primary, transport_id, None, attempts);
                        }
                        DeliveryResult::Failed { reason } => {
                            self.log.error(endpoint, format!("Email sending error: {reason}")).await;
                            stage = if self.secondary.is_some() { Stage::TrySecondary } else { Stage::TryAdminOnly };
                        }
                    }
                }
                Stage::TrySecondary => {
                    let transport = self.secondary.as_ref().unwrap_or(&self.primary);
                    self.log
                        .info(
                            endpoint,
                            format!(
                                "Attempting to send email via fallback to: {}, subject: {}",
                                message.to_display(),
                                message.subject()
                            ),
                        )
                        .await;

                    match self.try_transport(transport.as_ref(), message).await {
                        DeliveryResult::Delivered { transport_id } => {
                            self.log.info(endpoint, format!("Email sent successfully via fallback: {transport_id}")).await;
                            break Self::done(DeliveryMethod::Fallback, transport_id, None, attempts);
                        }
                        DeliveryResult::Failed { reason } => {
                            self.log.error(endpoint, format!("Fallback email sending error: {reason}")).await;
                            stage = Stage::TryAdminOnly;
                        }
                    }
                }
                Stage::TryAdminOnly => {
                    let copy = message.redirected(self.operations_address.clone(), URGENT_COPY_PREFIX);

                    match self.try_transport(self.primary.as_ref(), &copy).await {
                        DeliveryResult::Delivered { transport_id } => {
                            self.log
                                .info(endpoint, format!("Copy of email sent directly to admin: {}", self.operations_address))
                                .await;
                            break Self::done(DeliveryMethod::AdminOnly, transport_id, Some(ADMIN_ONLY_NOTE), attempts);
                        }
                        DeliveryResult::Failed { reason } => {
                            self.log.error(endpoint, format!("Failed to send copy to admin: {reason}")).await;
                            break Self::done(DeliveryMethod::Mocked, mock_transport_id(), Some(MOCKED_NOTE), attempts);
                        }
                    }
                }
            }
        };

        tracing::Span::current().record("method", outcome.method.as_str());
        self.metrics.outcomes_total.add(1, &[KeyValue::new("method", outcome.method.as_str())]);
        if outcome.is_mocked() {
            tracing::warn!(attempts = outcome.attempts, "All delivery paths failed; reporting mocked success");
        }

        outcome
    }

    async fn try_transport(&self, transport: &dyn MailTransport, message: &OutboundMessage) -> DeliveryResult {
        let result = attempt(message, transport, self.attempt_timeout).await;
        let label = if result.is_delivered() { "delivered" } else { "failed" };
        self.metrics
            .attempts_total
            .add(1, &[KeyValue::new("transport", transport.name().to_string()), KeyValue::new("result", label)]);
        result
    }

    fn done(method: DeliveryMethod, transport_id: String, note: Option<&str>, attempts: u8) -> SubmissionOutcome {
        SubmissionOutcome { accepted: true, transport_id, method, note: note.map(str::to_string), attempts }
    }
}

fn mock_transport_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("mock-{millis}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::delivery::transport::TransportError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Pops one scripted outcome per send; records every message it sees.
    #[derive(Debug)]
    struct ScriptedTransport {
        name: &'static str,
        script: Mutex<VecDeque<bool>>,
        seen: Mutex<Vec<OutboundMessage>>,
    }

    impl ScriptedTransport {
        fn new(name: &'static str, script: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(script.iter().copied().collect()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<OutboundMessage> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailTransport for ScriptedTransport {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(&self, message: &OutboundMessage) -> Result<String, TransportError> {
            self.seen.lock().unwrap().push(message.clone());
            let ok = self.script.lock().unwrap().pop_front().unwrap_or(false);
            if ok {
                Ok(format!("<{}@{}>", Uuid::new_v4(), self.name))
            } else {
                Err(TransportError::Connect(format!("{} unavailable", self.name)))
            }
        }
    }

    fn ops() -> Address {
        "ops@example.com".parse().unwrap()
    }

    fn message() -> OutboundMessage {
        OutboundMessage::builder("x@example.com".parse().unwrap(), "Hi", "<p>hi</p>").cc(ops()).build()
    }

    fn log() -> RequestLog {
        RequestLog::new(std::env::temp_dir().join(format!("formrelay-policy-test-{}", Uuid::new_v4())))
    }

    fn policy(primary: &Arc<ScriptedTransport>, secondary: Option<&Arc<ScriptedTransport>>) -> DeliveryPolicy {
        DeliveryPolicy::new(
            Arc::clone(primary) as Arc<dyn MailTransport>,
            secondary.map(|s| Arc::clone(s) as Arc<dyn MailTransport>),
            ops(),
            Duration::from_secs(1),
            log(),
        )
    }

    #[tokio::test]
    async fn test_primary_success_stops_immediately() {
        let primary = ScriptedTransport::new("primary", &[true]);
        let secondary = ScriptedTransport::new("secondary", &[true]);

        let outcome = policy(&primary, Some(&secondary)).deliver(&message(), PolicyEntry::Primary, LogEndpoint::Email).await;

        assert!(outcome.accepted);
        assert_eq!(outcome.method, DeliveryMethod::Primary);
        assert!(outcome.transport_id.ends_with("@primary>"));
        assert_eq!(outcome.attempts, 1);
        assert!(secondary.seen().is_empty());
    }

    #[tokio::test]
    async fn test_secondary_used_after_primary_failure() {
        let primary = ScriptedTransport::new("primary", &[false]);
        let secondary = ScriptedTransport::new("secondary", &[true]);

        let outcome = policy(&primary, Some(&secondary)).deliver(&message(), PolicyEntry::Primary, LogEndpoint::Email).await;

        assert_eq!(outcome.method, DeliveryMethod::Fallback);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(secondary.seen(), vec![message()]);
    }

    #[tokio::test]
    async fn test_admin_copy_after_both_transports_fail() {
        let primary = ScriptedTransport::new("primary", &[false, true]);
        let secondary = ScriptedTransport::new("secondary", &[false]);

        let outcome = policy(&primary, Some(&secondary)).deliver(&message(), PolicyEntry::Primary, LogEndpoint::Email).await;

        assert!(outcome.accepted);
        assert_eq!(outcome.method, DeliveryMethod::AdminOnly);
        assert_eq!(outcome.note.as_deref(), Some(ADMIN_ONLY_NOTE));

        let seen = primary.seen();
        let copy = seen.last().unwrap();
        assert_eq!(copy.subject(), "[URGENT COPY] Hi");
        assert_eq!(copy.to_display(), "ops@example.com");
        assert_eq!(copy.recipients().len(), 1);
    }

    #[tokio::test]
    async fn test_total_failure_is_mocked_success() {
        let primary = ScriptedTransport::new("primary", &[false, false]);
        let secondary = ScriptedTransport::new("secondary", &[false]);

        let outcome = policy(&primary, Some(&secondary)).deliver(&message(), PolicyEntry::Primary, LogEndpoint::Email).await;

        assert!(outcome.accepted);
        assert_eq!(outcome.method, DeliveryMethod::Mocked);
        assert!(outcome.transport_id.starts_with("mock-"));
        assert!(outcome.note.is_some_and(|n| !n.is_empty()));
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_without_secondary_skips_to_admin_copy() {
        let primary = ScriptedTransport::new("primary", &[false, true]);

        let outcome = policy(&primary, None).deliver(&message(), PolicyEntry::Primary, LogEndpoint::Email).await;

        assert_eq!(outcome.method, DeliveryMethod::AdminOnly);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_secondary_entry_skips_primary_attempt() {
        let primary = ScriptedTransport::new("primary", &[]);
        let secondary = ScriptedTransport::new("secondary", &[true]);

        let outcome =
            policy(&primary, Some(&secondary)).deliver(&message(), PolicyEntry::Secondary, LogEndpoint::EmailFallback).await;

        assert_eq!(outcome.method, DeliveryMethod::Fallback);
        assert_eq!(outcome.attempts, 1);
        assert!(primary.seen().is_empty());
    }

    #[tokio::test]
    async fn test_every_outcome_sequence_terminates_accepted() {
        for has_secondary in [false, true] {
            for bits in 0u8..8 {
                let script: Vec<bool> = (0..3).map(|i| bits & (1 << i) != 0).collect();
                let primary = ScriptedTransport::new("primary", &[script[0], script[2]]);
                let secondary = ScriptedTransport::new("secondary", &[script[1]]);
                let policy = policy(&primary, has_secondary.then_some(&secondary));

                for entry in [PolicyEntry::Primary, PolicyEntry::Secondary] {
                    let outcome = policy.deliver(&message(), entry, LogEndpoint::Email).await;
                    assert!(outcome.accepted, "script {script:?} entry {entry:?}");
                    assert!(outcome.attempts <= 3, "script {script:?} entry {entry:?}");
                    assert!(!outcome.transport_id.is_empty());
                }
            }
        }
    }
}
