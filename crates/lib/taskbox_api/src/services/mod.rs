//! Request-level services.

pub mod auth;
