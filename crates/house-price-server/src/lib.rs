//! House price server: the three-page estimator form over HTTP, plus a CLI
//! and an interactive REPL.

pub mod config;
pub mod pages;
pub mod repl;
pub mod session;
pub mod transport;
pub mod types;
pub mod wizard;

pub use config::{resolve_model_path, ConfigOverrides, ServerConfig};
pub use session::FormSessionStore;
pub use transport::{router, serve, AppState};
pub use types::{ServerError, ServerResult};
