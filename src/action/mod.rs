//! GitHub Action orchestration: configuration, naming, and the two
//! pull-request sequences.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | `INPUT_*` and runner environment |
//! | [`naming`] | Revision and traffic-tag names |
//! | [`preview`] | Open / close sequences |

pub mod config;
pub mod naming;
pub mod preview;

pub use config::ActionConfig;
pub use naming::{generate_revision_name, generate_traffic_tag};
pub use preview::{Mode, Outcome, PreviewAction};
