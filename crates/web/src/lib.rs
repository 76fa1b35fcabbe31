//! FlerteChat HTTP server.
//!
//! Serves the JSON API under `/api`, the payment webhook, and the built
//! single-page front end for every other path.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use std::path::PathBuf;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::WebError;
pub use session::SessionKeys;
pub use state::AppState;

/// Assemble the application.
///
/// With a `static_dir`, unknown paths fall back to its `index.html` so
/// client-side routes survive a reload.
pub fn app(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut router = routes::router();

    if let Some(dir) = static_dir {
        let index = dir.join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
