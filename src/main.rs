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

use formrelay_server::api::MgmtState;
use formrelay_server::config::Config;
use formrelay_server::domain::request_log::LogEndpoint;
use formrelay_server::{AppBuilder, telemetry};
use std::net::SocketAddr;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    formrelay_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app_router, mgmt_app, request_log, shutdown_rx) = async {
        // Phase 1: Component wiring
        let app = AppBuilder::new(config.clone()).build()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        formrelay_server::spawn_signal_handler(shutdown_tx);

        // Phase 2: Listeners and routers
        let app_router = formrelay_server::api::app_router(&config, app.services);
        let mgmt_app = formrelay_server::api::mgmt_router(MgmtState { health_service: app.health_service });

        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
        let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr).await?;

        tracing::info!(address = %api_addr, "listening");
        tracing::info!(address = %mgmt_addr, "management server listening");
        app.request_log.info(LogEndpoint::Server, format!("Server running on port {}", config.server.port)).await;

        Ok::<_, anyhow::Error>((api_listener, mgmt_listener, app_router, mgmt_app, app.request_log, shutdown_rx))
    }
    .instrument(boot_span)
    .await?;

    // Phase 3: Serve until a shutdown signal arrives
    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = mgmt_rx.wait_for(|&s| s).await;
        });

    // Phase 4: Bounded drain of in-flight requests
    let drain_timeout = std::time::Duration::from_secs(config.server.shutdown_timeout_secs);
    let mut drain_rx = shutdown_rx.clone();
    let servers = async { tokio::try_join!(api_server, mgmt_server) };
    let deadline = async {
        let _ = drain_rx.wait_for(|&s| s).await;
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = servers => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
            }
        }
        () = deadline => {
            tracing::warn!("Timeout waiting for in-flight requests to finish.");
        }
    }

    request_log.info(LogEndpoint::Server, "Server stopped").await;
    telemetry_guard.shutdown();
    Ok(())
}
