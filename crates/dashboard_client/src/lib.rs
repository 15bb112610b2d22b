//! crates/dashboard_client/src/lib.rs
//!
//! A typed client for the dashboard API, plus the observable auth and theme
//! state a front end binds to.

pub mod client;
pub mod context;
pub mod error;
pub mod token;

pub use client::{ApiClient, AuthSession, HealthStatus, NewStudySession, NewTestResult, ProfileUpdate};
pub use context::{AuthContext, ThemeContext};
pub use error::{ClientError, ClientResult};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
