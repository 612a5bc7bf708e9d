use crate::domain::delivery::{DeliveryMethod, SubmissionOutcome};
use crate::domain::submission::{EmailRequest, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct EmailPayload {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
}

impl EmailPayload {
    /// Recipient and subject for the "request received" log line.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{}, subject: {}",
            self.to.as_deref().unwrap_or_default(),
            self.subject.as_deref().unwrap_or_default()
        )
    }
}

impl TryFrom<EmailPayload> for EmailRequest {
    type Error = ValidationError;

    fn try_from(p: EmailPayload) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let mut field = |name: &'static str, value: Option<String>| {
            let value = value.filter(|v| !v.trim().is_empty());
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };
        let to = field("to", p.to);
        let subject = field("subject", p.subject);
        let html = field("html", p.html);

        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let to = to.trim().parse().map_err(|_| ValidationError::InvalidEmail)?;
        Ok(Self { to, subject, html })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailResponse {
    pub success: bool,
    pub message_id: String,
    pub method: DeliveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<bool>,
}

impl From<SubmissionOutcome> for EmailResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        let mocked = outcome.is_mocked();
        Self {
            success: outcome.accepted,
            message_id: outcome.transport_id,
            method: outcome.method,
            note: outcome.note,
            mock_response: mocked.then_some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_payload_valid() {
        let payload = EmailPayload {
            to: Some("guest@example.com".into()),
            subject: Some("Hi".into()),
            html: Some("<p>hi</p>".into()),
        };
        let req = EmailRequest::try_from(payload).unwrap();
        assert_eq!(req.to.to_string(), "guest@example.com");
        assert_eq!(req.html, "<p>hi</p>");
    }

    #[test]
    fn test_email_payload_missing_html() {
        let payload = EmailPayload { to: Some("guest@example.com".into()), subject: Some("Hi".into()), html: None };
        assert_eq!(EmailRequest::try_from(payload).unwrap_err(), ValidationError::MissingFields(vec!["html"]));
    }

    #[test]
    fn test_mocked_outcome_serialization() {
        let outcome = SubmissionOutcome {
            accepted: true,
            transport_id: "mock-1".into(),
            method: DeliveryMethod::Mocked,
            note: Some("Mock success response despite email failure".into()),
            attempts: 3,
        };
        let json = serde_json::to_value(EmailResponse::from(outcome)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["messageId"], "mock-1");
        assert_eq!(json["method"], "mocked");
        assert_eq!(json["mockResponse"], true);
    }

    #[test]
    fn test_primary_outcome_omits_optional_fields() {
        let outcome = SubmissionOutcome {
            accepted: true,
            transport_id: "<id@host>".into(),
            method: DeliveryMethod::Primary,
            note: None,
            attempts: 1,
        };
        let json = serde_json::to_value(EmailResponse::from(outcome)).unwrap();

        assert_eq!(json["method"], "primary");
        assert!(json.get("note").is_none());
        assert!(json.get("mockResponse").is_none());
    }
}
