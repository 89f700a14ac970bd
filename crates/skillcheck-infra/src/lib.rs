//! Infrastructure layer for skill checks.
//!
//! Contains implementations of the ports defined in `skillcheck-core`:
//! SQLite storage for sessions and checks, a REST client implementing
//! `SessionEndpoint`, and config/data-directory resolution.

pub mod config;
pub mod filesystem;
pub mod http;
pub mod sqlite;
