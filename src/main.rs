//! Server binary
//!
//! Validates the environment before anything else starts, initializes
//! telemetry from the resulting snapshot, wires the Supabase client
//! into the application state, and serves the router.

use std::net::SocketAddr;
use std::sync::Arc;

use aialpha_backend::app::build_router;
use aialpha_backend::config::ConfigLoader;
use aialpha_backend::handlers::AppState;
use aialpha_backend::services::SupabaseClient;
use aialpha_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loader = ConfigLoader::from_process_env();

    // Startup gate: refuse to boot on an invalid environment.
    if let Err(err) = loader.validate() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    let config = loader.get_config()?;
    telemetry::init(&config.logging);

    let supabase = Arc::new(SupabaseClient::new(&config.supabase));
    let state = AppState::new(config.clone(), supabase.clone(), supabase);
    let router = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        port = config.port,
        environment = config.environment.as_str(),
        "server listening"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
