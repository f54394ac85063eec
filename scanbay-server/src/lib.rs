//! HTTP API library for the Scanbay server binary.

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{AppError, AppResult};
pub use state::AppState;
