#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use crate::adapters::airports::AmadeusClient;
use crate::adapters::mail::{SmtpMailTransport, SmtpSettings};
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::airport_service::AirportService;
use crate::services::composer::Composer;
use crate::services::delivery::policy::DeliveryPolicy;
use crate::services::delivery::transport::MailTransport;
use crate::services::health_service::HealthService;
use crate::services::rate_limit_service::RateLimitService;
use crate::services::request_log::RequestLog;
use crate::services::submission_service::SubmissionService;
use anyhow::Context;
use lettre::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

type Transports = (Arc<dyn MailTransport>, Option<Arc<dyn MailTransport>>);

/// Wires configuration and transports into the service graph.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    transports: Option<Transports>,
}

#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
    pub request_log: RequestLog,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, transports: None }
    }

    /// Replaces the SMTP transports that would otherwise be built from configuration.
    #[must_use]
    pub fn with_transports(mut self, primary: Arc<dyn MailTransport>, secondary: Option<Arc<dyn MailTransport>>) -> Self {
        self.transports = Some((primary, secondary));
        self
    }

    fn smtp_transports(config: &Config) -> anyhow::Result<Transports> {
        let timeout = Duration::from_secs(config.mail.delivery_timeout_secs);

        let primary_settings = SmtpSettings::primary(&config.smtp, &config.mail.from_name, timeout);
        let primary: Arc<dyn MailTransport> = Arc::new(SmtpMailTransport::new("primary", &primary_settings)?);

        let secondary = SmtpSettings::fallback(&config.fallback_smtp, &config.smtp, &config.mail.from_name, timeout)
            .map(|settings| SmtpMailTransport::new("fallback", &settings))
            .transpose()?
            .map(|t| Arc::new(t) as Arc<dyn MailTransport>);

        Ok((primary, secondary))
    }

    /// # Errors
    /// Returns an error if the operational address is invalid or a transport
    /// or the airport lookup client cannot be constructed.
    pub fn build(self) -> anyhow::Result<App> {
        let config = self.config;

        let operations_address: Address = config
            .mail
            .operations_address
            .parse()
            .with_context(|| format!("invalid operations address: {}", config.mail.operations_address))?;

        let (primary, secondary) = match self.transports {
            Some(t) => t,
            None => Self::smtp_transports(&config)?,
        };
        if secondary.is_none() {
            tracing::info!("No fallback transport configured; failed deliveries go straight to the admin copy");
        }

        let request_log = RequestLog::new(&config.request_log.dir);
        let policy = DeliveryPolicy::new(
            Arc::clone(&primary),
            secondary,
            operations_address.clone(),
            Duration::from_secs(config.mail.delivery_timeout_secs),
            request_log.clone(),
        );
        let composer = Composer::new(operations_address, config.mail.from_name.clone())?;

        let airport_client = AmadeusClient::from_config(&config.airports)?.map(Arc::new);

        let services = ServiceContainer {
            submission_service: SubmissionService::new(composer, policy, request_log.clone()),
            airport_service: AirportService::new(airport_client),
            rate_limit_service: RateLimitService::new(config.server.trusted_proxies.clone()),
        };
        let health_service = HealthService::new(primary, request_log.clone(), config.health);

        Ok(App { services, health_service, request_log })
    }
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the structured log.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = info.location().map(ToString::to_string).unwrap_or_default();

        tracing::error!(panic.payload = %payload, panic.location = %location, "Panic occurred");
    }));
}
