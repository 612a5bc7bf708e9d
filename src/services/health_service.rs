use crate::config::HealthConfig;
use crate::services::delivery::transport::MailTransport;
use crate::services::request_log::RequestLog;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
pub struct Metrics {
    pub status: Gauge<i64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("formrelay-server");
        Self {
            status: meter
                .i64_gauge("formrelay_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    transport: Arc<dyn MailTransport>,
    log: RequestLog,
    config: HealthConfig,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(transport: Arc<dyn MailTransport>, log: RequestLog, config: HealthConfig) -> Self {
        Self { transport, log, config, metrics: Metrics::new() }
    }

    /// Checks that the primary mail transport accepts a session.
    ///
    /// # Errors
    /// Returns a string describing the failure if the server is unreachable.
    pub async fn check_transport(&self) -> Result<(), String> {
        let limit = Duration::from_millis(self.config.transport_timeout_ms);
        let label = format!("Mail transport {}", self.transport.name());
        self.probe("transport", &label, limit, self.transport.check()).await
    }

    /// Checks that the request log directory accepts writes.
    ///
    /// # Errors
    /// Returns a string describing the failure if the directory is not writable.
    pub async fn check_logs(&self) -> Result<(), String> {
        let limit = Duration::from_millis(self.config.logs_timeout_ms);
        let label = format!("Log directory {}", self.log.dir().display());
        self.probe("logs", &label, limit, self.log.check_writable()).await
    }

    async fn probe<E: Display>(
        &self,
        component: &'static str,
        label: &str,
        limit: Duration,
        check: impl Future<Output = Result<(), E>>,
    ) -> Result<(), String> {
        let result = match timeout(limit, check).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{label} check failed: {e}")),
            Err(_) => Err(format!("{label} check timed out")),
        };

        let value = i64::from(result.is_ok());
        self.metrics.status.record(value, &[KeyValue::new("component", component)]);
        result
    }
}
