//! HTTP clients for remote skill-check servers.

pub mod remote;
