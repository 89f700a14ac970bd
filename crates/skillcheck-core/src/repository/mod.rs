//! Port definitions.
//!
//! `SessionRepository` is the storage interface that the infrastructure layer
//! (skillcheck-infra) implements. `SessionEndpoint` is what a draft store talks
//! to: either the in-process `SessionService` or a remote HTTP client.

pub mod endpoint;
pub mod session;

/// Sort order for list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}
