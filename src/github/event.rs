//! Pull-request event payload (`GITHUB_EVENT_PATH`)

use std::path::Path;

use serde::Deserialize;

use crate::{Error, ErrorContext, Result};

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    pull_request: Option<PullRequest>,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
}

/// The parts of a `pull_request` event the preview flow cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    /// `opened`, `synchronize`, `reopened`, `closed`, ...
    pub action: String,
    pub number: u64,
}

impl PullRequestEvent {
    pub fn from_json(data: &str) -> Result<Self> {
        let payload: Payload = serde_json::from_str(data)?;
        let pull_request = payload.pull_request.ok_or_else(|| {
            Error::configuration_with_context(
                "failed to parse GitHub Event payload",
                ErrorContext::new()
                    .with_field_path("pull_request")
                    .with_details("the workflow must be triggered by a pull_request event")
                    .with_source("event_payload"),
            )
        })?;

        Ok(Self {
            action: payload.action.unwrap_or_default(),
            number: pull_request.number,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn is_closed(&self) -> bool {
        self.action == "closed"
    }
}
