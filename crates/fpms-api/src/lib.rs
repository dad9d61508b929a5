//! # FPMS API
//!
//! HTTP handlers, middleware, DTOs, and the router.

pub mod handlers;
pub mod middleware;
pub mod dto;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
