//! services/api/src/lib.rs
//!
//! The REST backend for the student learning dashboard.

pub mod adapters;
pub mod config;
pub mod error;
pub mod security;
pub mod seed;
pub mod web;
