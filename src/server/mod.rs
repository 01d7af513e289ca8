//! HTTP server layer for EyeIntel.
//!
//! This module provides the web surface: routes, request handlers,
//! signed session cookies and the HTML pages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET,POST /detector  ·  /register  ·  /login  ·  /logout       │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────┐  ┌──────────┐   │
//! │  │  handlers   │  │   session   │  │  routes  │  │  pages   │   │
//! │  │ (requests)  │  │ (signed     │  │ (router  │  │ (HTML    │   │
//! │  │             │  │  cookies)   │  │  config) │  │  render) │   │
//! │  └─────────────┘  └─────────────┘  └──────────┘  └──────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod pages;
pub mod routes;
pub mod session;

pub use handlers::{
    detector_page_handler, detector_submit, health_handler, landing_handler, login_page_handler,
    login_submit, logout_handler, register_page_handler, register_submit, AppState,
    CredentialsForm, ErrorResponse, HealthResponse,
};
pub use pages::{ResultOutcome, ResultView};
pub use routes::{create_router, RouterConfig, MAX_UPLOAD_BYTES};
pub use session::{
    require_session, CurrentUser, SessionAuth, SessionError, SessionUser, FLASH_COOKIE,
    SESSION_COOKIE,
};
