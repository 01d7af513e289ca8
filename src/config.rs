//! Configuration management for EyeIntel.
//!
//! All options can be set via command-line arguments or environment
//! variables with the `EYEINTEL_` prefix:
//!
//! - `EYEINTEL_HOST` - Server bind address (default: 0.0.0.0)
//! - `EYEINTEL_PORT` - Server port (default: 5000)
//! - `EYEINTEL_SECRET_KEY` - Secret key for session cookie signing
//! - `EYEINTEL_DATABASE_URL` - SQLite database URL for user records
//! - `EYEINTEL_UPLOAD_DIR` - Storage area for uploaded images and reports
//! - `EYEINTEL_MODEL_PATH` - Path to the ONNX classifier artifact
//! - `EYEINTEL_SESSION_TTL` - Session lifetime in seconds (default: 1 day)

use std::path::PathBuf;

use clap::Parser;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default session signing key. Must be replaced outside of development.
pub const DEFAULT_SECRET_KEY: &str = "development-secret-change-in-production";

/// Default SQLite database URL (created on first run).
pub const DEFAULT_DATABASE_URL: &str = "sqlite://users.db?mode=rwc";

/// Default storage area for uploaded images and generated reports.
pub const DEFAULT_UPLOAD_DIR: &str = "static/uploads";

/// Default path to the ONNX classifier artifact.
pub const DEFAULT_MODEL_PATH: &str = "model/fundus.onnx";

/// Default session lifetime in seconds (24 hours).
pub const DEFAULT_SESSION_TTL: u64 = 86_400;

// =============================================================================
// CLI Arguments
// =============================================================================

/// EyeIntel - A web service for eye-fundus image screening.
///
/// Registered users upload a fundus photograph, the service classifies it
/// against four conditions (cataract, diabetic retinopathy, glaucoma,
/// normal) and produces a downloadable PDF report.
#[derive(Parser, Debug, Clone)]
#[command(name = "eyeintel")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "EYEINTEL_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "EYEINTEL_PORT")]
    pub port: u16,

    // =========================================================================
    // Session Configuration
    // =========================================================================
    /// Secret key for HMAC-SHA256 session cookie signing.
    ///
    /// The default is only suitable for development; the server warns at
    /// startup when it is still in use.
    #[arg(long, default_value = DEFAULT_SECRET_KEY, env = "EYEINTEL_SECRET_KEY")]
    pub secret_key: String,

    /// Session lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL, env = "EYEINTEL_SESSION_TTL")]
    pub session_ttl: u64,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// SQLite database URL holding user records.
    #[arg(long, default_value = DEFAULT_DATABASE_URL, env = "EYEINTEL_DATABASE_URL")]
    pub database_url: String,

    /// Directory for uploaded images and generated reports.
    #[arg(long, default_value = DEFAULT_UPLOAD_DIR, env = "EYEINTEL_UPLOAD_DIR")]
    pub upload_dir: PathBuf,

    // =========================================================================
    // Model Configuration
    // =========================================================================
    /// Path to the ONNX classifier artifact.
    ///
    /// If the artifact is missing or corrupt the server still starts; the
    /// detector then reports the model as unavailable on every request.
    #[arg(long, default_value = DEFAULT_MODEL_PATH, env = "EYEINTEL_MODEL_PATH")]
    pub model_path: PathBuf,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret_key.is_empty() {
            return Err(
                "Session secret key must not be empty. Set --secret-key or EYEINTEL_SECRET_KEY"
                    .to_string(),
            );
        }

        if self.database_url.is_empty() {
            return Err(
                "Database URL is required. Set --database-url or EYEINTEL_DATABASE_URL".to_string(),
            );
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(
                "Upload directory is required. Set --upload-dir or EYEINTEL_UPLOAD_DIR".to_string(),
            );
        }

        if self.session_ttl == 0 {
            return Err("session_ttl must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Whether the insecure development secret is still in use.
    pub fn is_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
