//! Browser driver for the Columbia quote portal.
//!
//! [`procedure::ColumbiaPortal`] implements the core
//! [`SubmissionProcedure`](columbia_core::submission::SubmissionProcedure)
//! by talking to a W3C WebDriver server (chromedriver) through
//! [`webdriver::WebDriverClient`]. Each run leaves a zip archive behind via
//! [`trace::TraceRecorder`].

pub mod config;
pub mod form;
pub mod procedure;
pub mod trace;
pub mod webdriver;

pub use config::PortalConfig;
pub use procedure::ColumbiaPortal;
