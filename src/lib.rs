//! # preview-cloudrun
//!
//! Pull-request previews for Cloud Run services.
//!
//! For every pull request a new revision of the service is deployed with no
//! traffic share and a stable tag (`pr<number>`), so that it is reachable at
//! `https://pr<number>---<service host>` without touching production traffic.
//! The URL is posted on the pull request. When the pull request closes the
//! tag is removed again and the preview revisions are cleaned up.
//!
//! ## Overview
//!
//! The interesting part is the manifest layer: the service description is
//! fetched as YAML, its traffic list is rewritten in memory (insert, move or
//! remove a tag while keeping every serving share), and the document is
//! submitted back. Everything around it is glue to `gcloud` and the GitHub
//! API.
//!
//! ## Quick Start
//!
//! ```rust
//! use preview_cloudrun::manifest::{parse_service_manifest, TrafficTarget};
//!
//! let mut manifest = parse_service_manifest(r#"
//! apiVersion: serving.knative.dev/v1
//! kind: Service
//! metadata:
//!   name: hello
//! spec:
//!   template:
//!     metadata:
//!       name: hello-001
//!     spec:
//!       containers:
//!       - image: gcr.io/demo/hello:v1
//!   traffic:
//!   - percent: 100
//!     revisionName: hello-001
//! "#)?;
//!
//! manifest.update_preview_traffic("hello-v2", "pr7")?;
//! manifest.update_revision_name("hello-v2")?;
//! manifest.update_image("gcr.io/demo/hello:v2")?;
//!
//! assert_eq!(
//!     manifest.spec_traffic(),
//!     vec![
//!         TrafficTarget::revision("hello-001").with_percent(100),
//!         TrafficTarget::revision("hello-v2").with_tag("pr7"),
//!     ]
//! );
//! # Ok::<(), preview_cloudrun::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`manifest`] | Service manifest parsing, accessors and traffic rewrites |
//! | [`gcloud`] | `gcloud run` invocations behind a command-runner seam |
//! | [`github`] | Event payload, preview comments, comment minimization |
//! | [`action`] | Configuration and the open / close sequences |
//! | [`utils`] | YAML path helpers |

pub mod action;
pub mod gcloud;
pub mod github;
pub mod manifest;
pub mod utils;

pub use action::{ActionConfig, Mode, Outcome, PreviewAction};
pub use manifest::{parse_service_manifest, ManifestError, ServiceManifest, TrafficTarget};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
