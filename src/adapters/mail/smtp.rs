use crate::config::{FallbackSmtpConfig, SmtpConfig, TlsMode};
use crate::domain::message::{OutboundMessage, RecipientRole};
use crate::services::delivery::transport::{MailTransport, TransportError};
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::time::Duration;
use uuid::Uuid;

/// Everything needed to open an SMTP session.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub tls: TlsMode,
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl SmtpSettings {
    #[must_use]
    pub fn primary(config: &SmtpConfig, from_name: &str, timeout: Duration) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            from_address: config.from_address.clone(),
            from_name: from_name.to_string(),
            tls: config.tls,
            accept_invalid_certs: config.accept_invalid_certs,
            timeout,
        }
    }

    /// Secondary transport settings. Missing credentials and sender inherit
    /// from the primary transport. Returns `None` when no host is configured.
    #[must_use]
    pub fn fallback(
        config: &FallbackSmtpConfig,
        primary: &SmtpConfig,
        from_name: &str,
        timeout: Duration,
    ) -> Option<Self> {
        let host = config.host.clone()?;
        Some(Self {
            host,
            port: config.port,
            username: config.username.clone().or_else(|| primary.username.clone()),
            password: config.password.clone().or_else(|| primary.password.clone()),
            from_address: config.from_address.clone().unwrap_or_else(|| primary.from_address.clone()),
            from_name: from_name.to_string(),
            tls: config.tls,
            accept_invalid_certs: config.accept_invalid_certs,
            timeout,
        })
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_address", &self.from_address)
            .field("tls", &self.tls)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish_non_exhaustive()
    }
}

pub struct SmtpMailTransport {
    name: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

impl SmtpMailTransport {
    /// # Errors
    /// Returns an error if the sender address is invalid, the TLS parameters
    /// cannot be built, or only one half of the credentials is set.
    pub fn new(name: impl Into<String>, settings: &SmtpSettings) -> anyhow::Result<Self> {
        let name = name.into();
        let from_address: Address = settings
            .from_address
            .parse()
            .with_context(|| format!("invalid sender address for {name} transport: {}", settings.from_address))?;

        let tls = match settings.tls {
            TlsMode::None => Tls::None,
            mode => {
                let params = TlsParameters::builder(settings.host.clone())
                    .dangerous_accept_invalid_certs(settings.accept_invalid_certs)
                    .build()
                    .with_context(|| format!("TLS configuration error for {name} transport"))?;
                if mode == TlsMode::Tls { Tls::Wrapper(params) } else { Tls::Required(params) }
            }
        };

        let builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls)
            .timeout(Some(settings.timeout));

        let builder = match (&settings.username, &settings.password) {
            (Some(u), Some(p)) => builder.credentials(Credentials::new(u.clone(), p.clone())),
            (None, None) => builder,
            _ => anyhow::bail!("{name} transport needs both username and password, or neither"),
        };

        tracing::debug!(transport = %name, settings = ?settings, "SMTP transport configured");

        Ok(Self {
            name,
            transport: builder.build(),
            from: Mailbox::new(Some(settings.from_name.clone()), from_address),
            timeout: settings.timeout,
        })
    }

    fn build_message(&self, message: &OutboundMessage, message_id: String) -> Result<Message, TransportError> {
        let mut builder = Message::builder().message_id(Some(message_id)).from(self.from.clone());

        for recipient in message.recipients() {
            let mailbox = Mailbox::new(None, recipient.address.clone());
            builder = match recipient.role {
                RecipientRole::To => builder.to(mailbox),
                RecipientRole::Cc => builder.cc(mailbox),
                RecipientRole::Bcc => builder.bcc(mailbox),
            };
        }
        if let Some(reply_to) = message.reply_to() {
            builder = builder.reply_to(Mailbox::new(None, reply_to.clone()));
        }

        builder
            .subject(message.subject())
            .header(ContentType::TEXT_HTML)
            .body(message.body().to_string())
            .map_err(|e| TransportError::Message(e.to_string()))
    }

    fn classify(&self, error: &lettre::transport::smtp::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout(self.timeout);
        }
        match error.status().map(|code| code.to_string()) {
            Some(code) if matches!(code.as_str(), "530" | "534" | "535") => TransportError::Auth(error.to_string()),
            Some(_) => TransportError::Rejected(error.to_string()),
            None => TransportError::Connect(error.to_string()),
        }
    }
}

impl std::fmt::Debug for SmtpMailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailTransport")
            .field("name", &self.name)
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String, TransportError> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain());
        let email = self.build_message(message, message_id.clone())?;

        let response = self.transport.send(email).await.map_err(|e| self.classify(&e))?;
        tracing::debug!(transport = %self.name, code = %response.code(), "SMTP server accepted message");

        Ok(message_id)
    }

    async fn check(&self) -> Result<(), TransportError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Connect("server did not accept the session".to_string())),
            Err(e) => Err(self.classify(&e)),
        }
    }
}
