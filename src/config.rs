use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Default, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub smtp: SmtpConfig,

    #[command(flatten)]
    pub fallback_smtp: FallbackSmtpConfig,

    #[command(flatten)]
    pub mail: MailConfig,

    #[command(flatten)]
    pub request_log: RequestLogConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub airports: AirportLookupConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "FORMRELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public form API
    #[arg(long, env = "FORMRELAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management server (health probes)
    #[arg(long, env = "FORMRELAY_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for in-flight work after a shutdown signal
    #[arg(long, env = "FORMRELAY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "FORMRELAY_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,

    /// Comma-separated list of origins allowed by CORS. Empty allows any origin.
    #[arg(long, env = "FORMRELAY_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            mgmt_port: 9090,
            shutdown_timeout_secs: 10,
            trusted_proxies: ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "127.0.0.1/32"]
                .iter()
                .filter_map(|cidr| cidr.parse().ok())
                .collect(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TlsMode {
    /// Plain-text SMTP
    None,
    /// Upgrade the connection with STARTTLS
    #[default]
    Starttls,
    /// Implicit TLS from the first byte (SMTPS)
    Tls,
}

/// Primary mail transport.
#[derive(Clone, Debug, Args)]
pub struct SmtpConfig {
    /// SMTP server host
    #[arg(id = "smtp_host", long = "smtp-host", env = "FORMRELAY_SMTP_HOST", default_value = "localhost")]
    pub host: String,

    /// SMTP server port
    #[arg(id = "smtp_port", long = "smtp-port", env = "FORMRELAY_SMTP_PORT", default_value_t = 587)]
    pub port: u16,

    /// SMTP username
    #[arg(id = "smtp_username", long = "smtp-username", env = "FORMRELAY_SMTP_USERNAME")]
    pub username: Option<String>,

    /// SMTP password
    #[arg(id = "smtp_password", long = "smtp-password", env = "FORMRELAY_SMTP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Envelope and header sender address
    #[arg(id = "smtp_from_address", long = "smtp-from-address", env = "FORMRELAY_SMTP_FROM_ADDRESS", default_value = "no-reply@localhost")]
    pub from_address: String,

    /// Connection security
    #[arg(id = "smtp_tls", long = "smtp-tls", env = "FORMRELAY_SMTP_TLS", value_enum, default_value_t = TlsMode::Starttls)]
    pub tls: TlsMode,

    /// Accept self-signed or otherwise invalid server certificates
    #[arg(id = "smtp_accept_invalid_certs", long = "smtp-accept-invalid-certs", env = "FORMRELAY_SMTP_ACCEPT_INVALID_CERTS", default_value_t = false)]
    pub accept_invalid_certs: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "no-reply@localhost".to_string(),
            tls: TlsMode::Starttls,
            accept_invalid_certs: false,
        }
    }
}

/// Secondary mail transport. Disabled unless a host is given.
#[derive(Clone, Debug, Args)]
pub struct FallbackSmtpConfig {
    /// Fallback SMTP server host
    #[arg(id = "fallback_smtp_host", long = "fallback-smtp-host", env = "FORMRELAY_FALLBACK_SMTP_HOST")]
    pub host: Option<String>,

    /// Fallback SMTP server port
    #[arg(id = "fallback_smtp_port", long = "fallback-smtp-port", env = "FORMRELAY_FALLBACK_SMTP_PORT", default_value_t = 465)]
    pub port: u16,

    /// Fallback SMTP username (defaults to the primary username)
    #[arg(id = "fallback_smtp_username", long = "fallback-smtp-username", env = "FORMRELAY_FALLBACK_SMTP_USERNAME")]
    pub username: Option<String>,

    /// Fallback SMTP password (defaults to the primary password)
    #[arg(id = "fallback_smtp_password", long = "fallback-smtp-password", env = "FORMRELAY_FALLBACK_SMTP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Fallback sender address (defaults to the primary sender)
    #[arg(id = "fallback_smtp_from_address", long = "fallback-smtp-from-address", env = "FORMRELAY_FALLBACK_SMTP_FROM_ADDRESS")]
    pub from_address: Option<String>,

    /// Fallback connection security
    #[arg(id = "fallback_smtp_tls", long = "fallback-smtp-tls", env = "FORMRELAY_FALLBACK_SMTP_TLS", value_enum, default_value_t = TlsMode::Tls)]
    pub tls: TlsMode,

    /// Accept invalid certificates on the fallback transport
    #[arg(
        id = "fallback_smtp_accept_invalid_certs",
        long = "fallback-smtp-accept-invalid-certs",
        env = "FORMRELAY_FALLBACK_SMTP_ACCEPT_INVALID_CERTS",
        default_value_t = true
    )]
    pub accept_invalid_certs: bool,
}

impl Default for FallbackSmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 465,
            username: None,
            password: None,
            from_address: None,
            tls: TlsMode::Tls,
            accept_invalid_certs: true,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct MailConfig {
    /// Operational mailbox that receives a copy of every submission
    #[arg(long, env = "FORMRELAY_OPERATIONS_ADDRESS", default_value = "no-reply@localhost")]
    pub operations_address: String,

    /// Display name used in the From header
    #[arg(long, env = "FORMRELAY_FROM_NAME", default_value = "Kaur Travels")]
    pub from_name: String,

    /// Upper bound for a single delivery attempt
    #[arg(long, env = "FORMRELAY_DELIVERY_TIMEOUT_SECS", default_value_t = 15)]
    pub delivery_timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            operations_address: "no-reply@localhost".to_string(),
            from_name: "Kaur Travels".to_string(),
            delivery_timeout_secs: 15,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct RequestLogConfig {
    /// Directory holding the per-endpoint request logs
    #[arg(long = "log-dir", env = "FORMRELAY_LOG_DIR", default_value = "logs")]
    pub dir: String,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self { dir: "logs".to_string() }
    }
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed per client IP
    #[arg(long = "rate-limit-per-second", env = "FORMRELAY_RATE_LIMIT_PER_SECOND", default_value_t = 2)]
    pub per_second: u32,

    /// Burst allowance per client IP
    #[arg(long = "rate-limit-burst", env = "FORMRELAY_RATE_LIMIT_BURST", default_value_t = 10)]
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { per_second: 2, burst: 10 }
    }
}

#[derive(Clone, Debug, Args)]
pub struct AirportLookupConfig {
    /// Base URL of the airport lookup API
    #[arg(long = "airports-base-url", env = "FORMRELAY_AIRPORTS_BASE_URL", default_value = "https://test.api.amadeus.com")]
    pub base_url: String,

    /// OAuth2 client id. The lookup endpoint returns no results when unset.
    #[arg(long = "airports-client-id", env = "FORMRELAY_AIRPORTS_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long = "airports-client-secret", env = "FORMRELAY_AIRPORTS_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Maximum number of airports returned per search
    #[arg(long = "airports-limit", env = "FORMRELAY_AIRPORTS_LIMIT", default_value_t = 10)]
    pub limit: u32,

    /// Timeout for each upstream request
    #[arg(long = "airports-timeout-secs", env = "FORMRELAY_AIRPORTS_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Default for AirportLookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://test.api.amadeus.com".to_string(),
            client_id: None,
            client_secret: None,
            limit: 10,
            timeout_secs: 10,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the mail transport readiness check
    #[arg(long, env = "FORMRELAY_HEALTH_TRANSPORT_TIMEOUT_MS", default_value_t = 5000)]
    pub transport_timeout_ms: u64,

    /// Timeout for the log directory readiness check
    #[arg(long, env = "FORMRELAY_HEALTH_LOGS_TIMEOUT_MS", default_value_t = 1000)]
    pub logs_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { transport_timeout_ms: 5000, logs_timeout_ms: 1000 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint. Traces and metrics are exported only when set.
    #[arg(long, env = "FORMRELAY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Format of the process log written to stdout
    #[arg(long, env = "FORMRELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
