//! Action configuration
//!
//! Inputs arrive the way GitHub Actions passes them to a step: one
//! `INPUT_<NAME>` environment variable per `with:` key. Runner-provided
//! variables (`GITHUB_REPOSITORY`, `GITHUB_EVENT_PATH`, ...) fill in the
//! rest.

use std::path::PathBuf;

use crate::gcloud::GcloudOptions;
use crate::github::Repository;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub project: Option<String>,
    pub region: String,
    pub service: String,
    /// Required by the open sequence only
    pub image: Option<String>,
    /// Generated from service and image when unset
    pub revision: Option<String>,
    /// `pr<number>` when unset
    pub tag: Option<String>,
    /// Delete untagged preview revisions when a pull request closes
    pub cleanup: bool,
    pub token: String,
    pub gcloud_path: String,
    pub credentials_file: Option<PathBuf>,
    pub repository: Repository,
    pub event_path: Option<PathBuf>,
    pub api_url: String,
    pub graphql_url: String,
}

impl ActionConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let input = |name: &str| var(&input_key(name));

        let service = input("service").ok_or_else(|| missing("service name must be set", "service"))?;
        let token = input("token").ok_or_else(|| missing("github token must be set", "token"))?;

        let repository = var("GITHUB_REPOSITORY").ok_or_else(|| {
            Error::configuration_with_context(
                "repository must be set",
                ErrorContext::new()
                    .with_field_path("GITHUB_REPOSITORY")
                    .with_source("action_config"),
            )
        })?;
        let repository = repository.parse::<Repository>().map_err(|e| {
            Error::configuration_with_context(
                e.to_string(),
                ErrorContext::new()
                    .with_field_path("GITHUB_REPOSITORY")
                    .with_source("action_config"),
            )
        })?;

        let cleanup = input("cleanup")
            .unwrap_or_else(|| "true".to_string())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            project: input("project"),
            region: input("region").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            service,
            image: input("image"),
            revision: input("revision"),
            tag: input("tag"),
            cleanup,
            token,
            gcloud_path: input("gcloud_path").unwrap_or_else(|| "gcloud".to_string()),
            credentials_file: var("GOOGLE_GHA_CREDS_PATH").map(PathBuf::from),
            repository,
            event_path: var("GITHUB_EVENT_PATH").map(PathBuf::from),
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            graphql_url: var("GITHUB_GRAPHQL_URL")
                .unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string()),
        })
    }

    pub fn gcloud_options(&self) -> GcloudOptions {
        GcloudOptions {
            project_id: self.project.clone(),
            tool_command: self.gcloud_path.clone(),
        }
    }
}

/// Environment variable GitHub Actions uses for the input `name`
pub fn input_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

fn missing(message: &str, input: &str) -> Error {
    Error::configuration_with_context(
        message,
        ErrorContext::new()
            .with_field_path(input_key(input))
            .with_source("action_config"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("INPUT_SERVICE", "helloworld"),
        ("INPUT_TOKEN", "ghs_xxx"),
        ("GITHUB_REPOSITORY", "knanao/preview-cloudrun"),
    ];

    #[test]
    fn applies_defaults() {
        let config = ActionConfig::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.region, DEFAULT_REGION);
        assert!(config.cleanup);
        assert_eq!(config.gcloud_path, "gcloud");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.image.is_none());
        assert!(config.credentials_file.is_none());
        assert_eq!(config.repository.owner, "knanao");
    }

    #[test]
    fn reads_inputs_and_runner_variables() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("INPUT_REGION", "asia-northeast1"),
            ("INPUT_IMAGE", "gcr.io/demo/app:v1.2.0"),
            ("INPUT_CLEANUP", "FALSE"),
            ("INPUT_PROJECT", "demo"),
            ("INPUT_TAG", "  "),
            ("GOOGLE_GHA_CREDS_PATH", "/tmp/creds.json"),
        ]);
        let config = ActionConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.region, "asia-northeast1");
        assert_eq!(config.image.as_deref(), Some("gcr.io/demo/app:v1.2.0"));
        assert!(!config.cleanup);
        assert!(config.tag.is_none());
        assert_eq!(config.gcloud_options().project_id.as_deref(), Some("demo"));
        assert_eq!(config.credentials_file, Some(PathBuf::from("/tmp/creds.json")));
    }

    #[test]
    fn requires_service_token_and_repository() {
        for skip in ["INPUT_SERVICE", "INPUT_TOKEN", "GITHUB_REPOSITORY"] {
            let pairs: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != skip).collect();
            let err = ActionConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(
                err.context().and_then(|c| c.field_path.as_deref()),
                Some(skip)
            );
        }
    }

    #[test]
    fn rejects_malformed_repository() {
        let mut pairs = BASE.to_vec();
        pairs.retain(|(k, _)| *k != "GITHUB_REPOSITORY");
        pairs.push(("GITHUB_REPOSITORY", "no-slash"));

        let err = ActionConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("invalid repository 'no-slash'"));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("GITHUB_REPOSITORY")
        );
    }

    #[test]
    fn input_keys_follow_actions_convention() {
        assert_eq!(input_key("gcloud_path"), "INPUT_GCLOUD_PATH");
        assert_eq!(input_key("my input"), "INPUT_MY_INPUT");
    }
}
