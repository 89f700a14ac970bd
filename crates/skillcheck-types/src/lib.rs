//! Shared domain types for skill-check assessment sessions.
//!
//! This crate contains the domain types used across the workspace:
//! Session, Check, CompetenceLevel, Diff, Baseline, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod check;
pub mod config;
pub mod diff;
pub mod error;
pub mod session;
