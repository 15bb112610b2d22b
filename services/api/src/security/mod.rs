//! services/api/src/security/mod.rs
//!
//! Credential handling: password hashing with Argon2 and signed JWT bearer
//! tokens.

pub mod jwt;
pub mod password;

pub use jwt::{bearer_token, Claims, TokenKeys};
pub use password::{hash_password, verify_password};
