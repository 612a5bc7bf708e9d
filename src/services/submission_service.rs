use crate::domain::delivery::{PolicyEntry, SubmissionOutcome};
use crate::domain::request_log::LogEndpoint;
use crate::domain::submission::{EmailRequest, FormSubmission, ValidationError};
use crate::services::composer::Composer;
use crate::services::delivery::policy::DeliveryPolicy;
use crate::services::request_log::RequestLog;

/// Entry point for everything the public API accepts: forms and raw e-mail.
#[derive(Clone, Debug)]
pub struct SubmissionService {
    composer: Composer,
    policy: DeliveryPolicy,
    log: RequestLog,
}

impl SubmissionService {
    #[must_use]
    pub const fn new(composer: Composer, policy: DeliveryPolicy, log: RequestLog) -> Self {
        Self { composer, policy, log }
    }

    #[must_use]
    pub const fn log(&self) -> &RequestLog {
        &self.log
    }

    #[must_use]
    pub const fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    #[tracing::instrument(skip_all, fields(endpoint = submission.endpoint().file_stem()))]
    pub async fn submit_form(&self, submission: &FormSubmission) -> SubmissionOutcome {
        let endpoint = submission.endpoint();
        self.log.info(endpoint, format!("Processing submission: {}", submission.summary())).await;

        let message = self.composer.compose(submission);
        let outcome = self.policy.deliver(&message, PolicyEntry::Primary, endpoint).await;

        self.log
            .info(endpoint, format!("Submission processed via {} ({})", outcome.method.as_str(), outcome.transport_id))
            .await;
        outcome
    }

    /// Relays a caller-rendered message. `entry` selects `/send-email` or
    /// `/send-email-fallback` semantics.
    #[tracing::instrument(skip_all, fields(entry = ?entry))]
    pub async fn send_email(&self, request: &EmailRequest, entry: PolicyEntry) -> SubmissionOutcome {
        let endpoint = Self::email_endpoint(entry);
        let message = self.composer.compose_email(request);
        self.policy.deliver(&message, entry, endpoint).await
    }

    /// Records a rejected payload. Nothing else happens for invalid input.
    pub async fn reject(&self, endpoint: LogEndpoint, error: &ValidationError) {
        let detail = match error {
            ValidationError::MissingFields(fields) => format!("{error}: {}", fields.join(", ")),
            other => other.to_string(),
        };
        self.log.error(endpoint, format!("Validation failed: {detail}")).await;
    }

    #[must_use]
    pub const fn email_endpoint(entry: PolicyEntry) -> LogEndpoint {
        match entry {
            PolicyEntry::Primary => LogEndpoint::Email,
            PolicyEntry::Secondary => LogEndpoint::EmailFallback,
        }
    }
}
