//! Client-side editing of one assessment session.
//!
//! A [`store::DraftStore`] holds the working copy of a session and an ordered
//! [`log::DiffLog`] of everything not yet persisted. Saving sends the log to a
//! [`SessionEndpoint`](crate::repository::endpoint::SessionEndpoint) as one batch.
//! [`assignment::AssignmentView`] covers whole-set assignment writes that
//! bypass the log.

pub mod assignment;
pub mod log;
pub mod lookup;
pub mod optimistic;
pub mod store;

pub use assignment::AssignmentView;
pub use log::{DiffLog, append_diff};
pub use lookup::lookup_check;
pub use store::{DraftStatus, DraftStore};
