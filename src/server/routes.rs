//! Router configuration for EyeIntel.
//!
//! This module defines the HTTP routes and applies the session
//! middleware to the protected subset.
//!
//! # Route Structure
//!
//! ```text
//! /                - Landing page (public)
//! /register        - Registration form (public)
//! /login           - Login form (public)
//! /health          - Health check (public)
//! /uploads/*       - Stored images and reports (public, static)
//! /detector        - Upload and classify (session required)
//! /logout          - Clear session (session required)
//! ```

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    detector_page_handler, detector_submit, health_handler, landing_handler, login_page_handler,
    login_submit, logout_handler, register_page_handler, register_submit, AppState,
};
use super::session::require_session;
use crate::users::UserStore;

/// Maximum accepted upload size in bytes (20 MB).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl RouterConfig {
    /// Create a router configuration with defaults: tracing enabled,
    /// 20 MB upload limit.
    pub fn new() -> Self {
        Self {
            enable_tracing: true,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the maximum accepted upload size.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Public routes (landing, register, login, health, static uploads) are
/// served directly; the detector and logout routes are wrapped in the
/// session middleware which redirects unauthenticated requests to the
/// login flow.
pub fn create_router<S>(state: AppState<S>, config: RouterConfig) -> Router
where
    S: UserStore + 'static,
{
    let upload_dir = state.intake.upload_dir().to_path_buf();

    let protected_routes = Router::new()
        .route(
            "/detector",
            get(detector_page_handler).post(detector_submit::<S>),
        )
        .route("/logout", get(logout_handler))
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            require_session,
        ))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/", get(landing_handler))
        .route(
            "/register",
            get(register_page_handler).post(register_submit::<S>),
        )
        .route("/login", get(login_page_handler).post(login_submit::<S>))
        .route("/health", get(health_handler::<S>))
        .with_state(state);

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
