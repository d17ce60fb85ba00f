//! Web server module
//!
//! JSON HTTP API over the orchestrator.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
