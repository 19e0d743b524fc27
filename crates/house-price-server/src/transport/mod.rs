//! HTTP transport for the estimator form.

pub mod http;

pub use http::{router, serve, AppState};
