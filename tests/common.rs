#![allow(dead_code)]

use async_trait::async_trait;
use formrelay_server::AppBuilder;
use formrelay_server::api::MgmtState;
use formrelay_server::config::Config;
use formrelay_server::domain::message::OutboundMessage;
use formrelay_server::services::delivery::transport::{MailTransport, TransportError};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const OPERATIONS_ADDRESS: &str = "ops@kaurtravels.es";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Accept,
    Reject,
    Hang,
}

/// Scripted stand-in for an SMTP server. Each send pops the next behaviour
/// from the script and falls back to `default` once it is exhausted.
#[derive(Debug)]
pub struct MockTransport {
    name: String,
    script: Mutex<VecDeque<Behaviour>>,
    default: Behaviour,
    sent: Mutex<Vec<OutboundMessage>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new(name: &str, default: Behaviour) -> Arc<Self> {
        Self::scripted(name, &[], default)
    }

    pub fn scripted(name: &str, script: &[Behaviour], default: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(script.iter().copied().collect()),
            default,
            sent: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages the transport accepted.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let behaviour = self.script.lock().unwrap().pop_front().unwrap_or(self.default);

        match behaviour {
            Behaviour::Accept => {
                self.sent.lock().unwrap().push(message.clone());
                Ok(format!("<{n}@{}.mock>", self.name))
            }
            Behaviour::Reject => Err(TransportError::Connect("connection refused".to_string())),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Connect("unreachable".to_string()))
            }
        }
    }

    async fn check(&self) -> Result<(), TransportError> {
        match self.default {
            Behaviour::Accept => Ok(()),
            _ => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}

pub fn get_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.mgmt_port = 0;
    config.rate_limit.per_second = 10_000;
    config.rate_limit.burst = 10_000;
    config.mail.operations_address = OPERATIONS_ADDRESS.to_string();
    config.mail.delivery_timeout_secs = 1;
    config.request_log.dir =
        std::env::temp_dir().join(format!("formrelay-it-{}", Uuid::new_v4())).to_string_lossy().into_owned();
    config.health.transport_timeout_ms = 500;
    config.health.logs_timeout_ms = 500;
    config
}

pub struct TestApp {
    pub client: reqwest::Client,
    pub server_url: String,
    pub mgmt_url: String,
    pub config: Config,
    pub primary: Arc<MockTransport>,
    pub secondary: Option<Arc<MockTransport>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(get_test_config(), MockTransport::new("primary", Behaviour::Accept), None).await
    }

    pub async fn spawn_with_transports(primary: Arc<MockTransport>, secondary: Option<Arc<MockTransport>>) -> Self {
        Self::spawn_with(get_test_config(), primary, secondary).await
    }

    pub async fn spawn_with(
        config: Config,
        primary: Arc<MockTransport>,
        secondary: Option<Arc<MockTransport>>,
    ) -> Self {
        formrelay_server::telemetry::init_test_telemetry();

        let app = AppBuilder::new(config.clone())
            .with_transports(primary.clone(), secondary.clone().map(|s| s as Arc<dyn MailTransport>))
            .build()
            .expect("Failed to build app");

        let router = formrelay_server::api::app_router(&config, app.services);
        let mgmt = formrelay_server::api::mgmt_router(MgmtState { health_service: app.health_service });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self { client: reqwest::Client::new(), server_url, mgmt_url, config, primary, secondary }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/forms{path}", self.server_url)
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(body).send().await.unwrap()
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.request_log.dir)
    }

    /// Contents of `<log_dir>/<stem>.log`, or an empty string if nothing was written.
    pub fn read_log(&self, stem: &str) -> String {
        std::fs::read_to_string(self.log_dir().join(format!("{stem}.log"))).unwrap_or_default()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(self.log_dir());
    }
}
