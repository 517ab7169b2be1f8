//! User registration and authentication service.
//!
//! Accounts register with a full name, email and password, activate through
//! a single-use verification token, and authenticate with short-lived signed
//! session tokens.

pub mod app;
pub mod auth;
pub mod config;
pub mod response;
pub mod state;
