//! Service manifest layer: parsing, typed access and traffic rewrites.
//!
//! # Service Manifest Layer
//!
//! The preview flow fetches a Cloud Run service as YAML, changes a few
//! fields, and submits the result back. This module owns everything that
//! happens to the document in between. It performs no I/O.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`parser`] | YAML text to [`ServiceManifest`], CLI output cleanup |
//! | [`service`] | Field accessors and mutators |
//! | [`traffic`] | Traffic targets and the preview-tag rewrite |
//! | [`error`] | Manifest error types |
//!
//! ## Example
//!
//! ```rust
//! use preview_cloudrun::manifest::parse_service_manifest;
//!
//! let mut manifest = parse_service_manifest(
//!     "apiVersion: serving.knative.dev/v1\n\
//!      metadata:\n  name: hello\n\
//!      spec:\n  traffic:\n  - percent: 100\n    revisionName: hello-001\n",
//! )?;
//! manifest.update_preview_traffic("hello-pr1", "pr1")?;
//! assert_eq!(manifest.revisions_for_tag("pr1"), vec!["hello-pr1"]);
//! # Ok::<(), preview_cloudrun::manifest::ManifestError>(())
//! ```

pub mod error;
pub mod parser;
pub mod service;
pub mod traffic;

pub use error::ManifestError;
pub use parser::{parse_service_manifest, strip_preamble};
pub use service::ServiceManifest;
pub use traffic::TrafficTarget;
