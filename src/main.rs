use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use booking_agent::adapters::http::{booking_router, cors_layer, BookingAppState};
use booking_agent::adapters::{CsvBookingSink, GeminiConfig, GeminiProvider};
use booking_agent::application::{ConversationEngine, GenerationClient, SessionRegistry};
use booking_agent::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use booking_agent::ports::AIError;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to initialise text provider: {0}")]
    Provider(#[from] AIError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.server);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Booking agent stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    config.validate()?;

    let api_key = config
        .ai
        .gemini_api_key
        .clone()
        .ok_or(ValidationError::MissingRequired("GEMINI_API_KEY"))?;
    let provider = GeminiProvider::new(
        GeminiConfig::new(api_key)
            .with_model(&config.ai.model)
            .with_base_url(&config.ai.base_url)
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries),
    )?;

    let mut generation = GenerationClient::new(Arc::new(provider));
    if let Some(temperature) = config.ai.temperature {
        generation = generation.with_temperature(temperature);
    }

    let sink = CsvBookingSink::new(&config.storage.bookings_path);
    let engine = ConversationEngine::new(generation, Arc::new(sink));

    let sessions = SessionRegistry::new();
    let sweeper = sessions.spawn_idle_sweeper(
        config.server.session_sweep_interval(),
        config.server.session_idle(),
    );

    let mut app = booking_router(BookingAppState::new(engine, sessions));
    if let Some(cors) = cors_layer(&config.server.cors_origins_list()) {
        app = app.layer(cors);
    }

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        model = %config.ai.model,
        bookings = %config.storage.bookings_path.display(),
        "Booking agent listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
