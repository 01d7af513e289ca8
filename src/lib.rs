//! # EyeIntel
//!
//! A web service for eye-fundus image screening.
//!
//! Registered users upload a fundus photograph; the service runs a
//! pre-trained classifier predicting one of four conditions (cataract,
//! diabetic retinopathy, glaucoma, normal) and renders the result
//! together with a downloadable PDF report.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`users`] - Credential store (SQLite) and password hashing
//! - [`intake`] - Upload validation, filename sanitization, persistence
//! - [`classify`] - ONNX inference engine, labels and postprocessing
//! - [`report`] - PDF report generation
//! - [`server`] - Axum-based HTTP server, sessions and pages
//! - [`config`] - CLI and configuration types
//!
//! The request pipeline for a classification is:
//!
//! ```text
//! HTTP request → session gate → image intake → inference engine
//!              → report generator → rendered response
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use eyeintel::{
//!     create_router, AppState, ImageIntake, InferenceEngine, ReportGenerator, RouterConfig,
//!     SessionAuth, SqliteUserStore,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqliteUserStore::connect("sqlite://users.db?mode=rwc")
//!         .await
//!         .unwrap();
//!     let engine = InferenceEngine::load(std::path::Path::new("model/fundus.onnx"));
//!
//!     let state = AppState::new(
//!         store,
//!         engine,
//!         SessionAuth::new("secret-key", Duration::from_secs(86_400)),
//!         ImageIntake::new("static/uploads"),
//!         ReportGenerator::new("static/uploads"),
//!     );
//!     let router = create_router(state, RouterConfig::new());
//!
//!     // Bind a listener and serve the router...
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod intake;
pub mod report;
pub mod server;
pub mod users;

// Re-export commonly used types
pub use classify::{
    decode_and_resize, interpret_scores, ImageClassifier, InferenceEngine, Label, OnnxClassifier,
    Prediction, INPUT_HEIGHT, INPUT_WIDTH,
};
pub use config::Config;
pub use error::{ClassifyError, CredentialError, IntakeError, ReportError};
pub use intake::{allowed_file, sanitize_filename, ImageIntake, StoredImage, ALLOWED_EXTENSIONS};
pub use report::{precaution_for, report_filename, ReportGenerator, REPORT_TITLE};
pub use server::{
    create_router, require_session, AppState, CredentialsForm, CurrentUser, ErrorResponse,
    HealthResponse, ResultOutcome, ResultView, RouterConfig, SessionAuth, SessionError,
    SessionUser, FLASH_COOKIE, SESSION_COOKIE,
};
pub use users::{password, SqliteUserStore, User, UserStore};
