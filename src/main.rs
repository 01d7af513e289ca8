//! EyeIntel - eye-fundus screening web service.
//!
//! This binary wires up the credential store, the inference engine and
//! the HTTP server from the configuration.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eyeintel::{
    config::Config,
    server::{create_router, AppState, RouterConfig, SessionAuth},
    ImageIntake, InferenceEngine, ReportGenerator, SqliteUserStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("EyeIntel v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Database: {}", config.database_url);
    info!("  Upload dir: {}", config.upload_dir.display());
    info!("  Model: {}", config.model_path.display());
    info!("  Session TTL: {}s", config.session_ttl);

    if config.is_default_secret() {
        warn!("  Secret key: DEVELOPMENT DEFAULT - sessions are forgeable");
        warn!("        Set EYEINTEL_SECRET_KEY before exposing this server");
    }

    // Create the upload storage area
    if let Err(e) = std::fs::create_dir_all(&config.upload_dir) {
        error!(
            "Failed to create upload directory {}: {}",
            config.upload_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    // Connect to the credential store
    let store = match SqliteUserStore::connect(&config.database_url).await {
        Ok(store) => {
            info!("Connected to credential store");
            store
        }
        Err(e) => {
            error!("Failed to connect to credential store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Construct the inference engine once, up front. A load failure is
    // captured and downgraded: the server still starts and the detector
    // reports the model as unavailable on every request.
    let engine = InferenceEngine::load(&config.model_path);
    if !engine.is_available() {
        warn!("Classifier unavailable; /detector will report an error result");
    }

    let state = AppState::new(
        store,
        engine,
        SessionAuth::new(&config.secret_key, Duration::from_secs(config.session_ttl)),
        ImageIntake::new(&config.upload_dir),
        ReportGenerator::new(&config.upload_dir),
    );

    let router = create_router(state, RouterConfig::new().with_tracing(!config.no_tracing));

    // Bind and serve
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "eyeintel=debug,tower_http=debug"
    } else {
        "eyeintel=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
