//! Job execution engine for the Columbia quote submitter.
//!
//! Jobs flow through a FIFO [`queue::TaskQueue`], wait for a slot from the
//! [`slots::SlotPool`] (one slot per exclusive browser session), and are run
//! by the [`dispatcher::Dispatcher`]'s worker tasks. Every lifecycle change
//! is written to the [`registry::JobRegistry`], which backs status queries.

pub mod config;
pub mod dispatcher;
pub mod queue;
pub mod registry;
pub mod slots;

pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, DispatcherStats};
