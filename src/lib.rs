//! Launch a Jenkins job, wait for it to finish and fetch its console log.
//!
//! The [`jenkins`] module holds the build lifecycle: submitting a build,
//! resolving its queue item, polling the pipeline stage view until the
//! build is final, and streaming the console output.

pub mod auth;
pub mod error;
pub mod jenkins;
pub mod output;

pub use auth::Credentials;
pub use error::{LauncherError, Result};
