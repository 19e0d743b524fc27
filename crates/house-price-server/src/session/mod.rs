//! Server-side form session management.

pub mod manager;

pub use manager::{FormSession, FormSessionStore};
