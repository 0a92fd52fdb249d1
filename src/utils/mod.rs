//! Shared helpers

pub mod yaml_path;

pub use yaml_path::{is_truthy, scalar_to_string, PathError, YamlPath};
