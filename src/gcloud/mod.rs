//! gcloud collaborator: describes, replaces and prunes Cloud Run services
//! through the Cloud SDK command line.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`Gcloud`] | `gcloud run` / `gcloud auth` invocations |
//! | [`CommandRunner`] | Process execution seam |
//! | [`TokioCommandRunner`] | Default runner on `tokio::process` |

pub mod client;
pub mod runner;

pub use client::{Gcloud, GcloudOptions};
pub use runner::{CommandOutput, CommandRunner, TokioCommandRunner};
