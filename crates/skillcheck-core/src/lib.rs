//! Draft store, diff coalescing, and session service for skill checks.
//!
//! This crate defines the "ports" (repository and endpoint traits) that the
//! infrastructure layer implements. It depends only on `skillcheck-types` --
//! never on `skillcheck-infra` or any database/IO crate.

pub mod draft;
pub mod repository;
pub mod service;
