use lettre::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientRole {
    To,
    Cc,
    Bcc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub role: RecipientRole,
    pub address: Address,
}

/// A transport-ready e-mail. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    recipients: Vec<Recipient>,
    subject: String,
    body: String,
    reply_to: Option<Address>,
}

impl OutboundMessage {
    #[must_use]
    pub fn builder(to: Address, subject: impl Into<String>, body: impl Into<String>) -> OutboundMessageBuilder {
        OutboundMessageBuilder {
            recipients: vec![Recipient { role: RecipientRole::To, address: to }],
            subject: subject.into(),
            body: body.into(),
            reply_to: None,
        }
    }

    #[must_use]
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn recipients_with_role(&self, role: RecipientRole) -> impl Iterator<Item = &Address> {
        self.recipients.iter().filter(move |r| r.role == role).map(|r| &r.address)
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn reply_to(&self) -> Option<&Address> {
        self.reply_to.as_ref()
    }

    /// Primary recipients joined for log lines.
    #[must_use]
    pub fn to_display(&self) -> String {
        self.recipients_with_role(RecipientRole::To).map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }

    /// Same body and reply-to, a single new recipient and a prefixed subject.
    #[must_use]
    pub fn redirected(&self, to: Address, subject_prefix: &str) -> Self {
        Self {
            recipients: vec![Recipient { role: RecipientRole::To, address: to }],
            subject: format!("{subject_prefix}{}", self.subject),
            body: self.body.clone(),
            reply_to: self.reply_to.clone(),
        }
    }
}

#[derive(Debug)]
pub struct OutboundMessageBuilder {
    recipients: Vec<Recipient>,
    subject: String,
    body: String,
    reply_to: Option<Address>,
}

impl OutboundMessageBuilder {
    #[must_use]
    pub fn cc(mut self, address: Address) -> Self {
        self.recipients.push(Recipient { role: RecipientRole::Cc, address });
        self
    }

    #[must_use]
    pub fn bcc(mut self, address: Address) -> Self {
        self.recipients.push(Recipient { role: RecipientRole::Bcc, address });
        self
    }

    #[must_use]
    pub fn reply_to(mut self, address: Address) -> Self {
        self.reply_to = Some(address);
        self
    }

    #[must_use]
    pub fn build(self) -> OutboundMessage {
        OutboundMessage { recipients: self.recipients, subject: self.subject, body: self.body, reply_to: self.reply_to }
    }
}
