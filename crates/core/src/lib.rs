//! Domain types for the Columbia quote submitter.
//!
//! This crate has zero internal dependencies so the worker, portal driver,
//! and API crates can all share the same job model and input rules.

pub mod error;
pub mod job;
pub mod naming;
pub mod quote_input;
pub mod submission;
pub mod types;
