//! The open / close sequences

use std::str::FromStr;

use tracing::{info, warn};

use super::config::ActionConfig;
use super::naming::{generate_revision_name, generate_traffic_tag};
use crate::gcloud::{CommandRunner, Gcloud};
use crate::github::{comment, GitHubClient, PullRequestEvent};
use crate::{Error, ErrorContext, Result};

/// Which sequence to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Open,
    Close,
    /// Close for `closed` events, open otherwise
    Auto,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Mode::Open),
            "close" => Ok(Mode::Close),
            "auto" | "" => Ok(Mode::Auto),
            other => Err(Error::configuration_with_context(
                format!("unknown mode '{}'", other),
                ErrorContext::new()
                    .with_details("expected one of: open, close, auto")
                    .with_source("cli"),
            )),
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Opened {
        revision: String,
        tag: String,
        url: Option<String>,
        comment_url: String,
    },
    Closed {
        tag: String,
        /// Revisions the tag was taken from
        untagged: Vec<String>,
        /// Revisions deleted afterwards
        deleted: Vec<String>,
    },
}

impl Outcome {
    /// Step outputs, as `name=value` pairs for `$GITHUB_OUTPUT`
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        match self {
            Outcome::Opened {
                revision, tag, url, ..
            } => vec![
                ("revision", revision.clone()),
                ("tag", tag.clone()),
                ("url", url.clone().unwrap_or_default()),
            ],
            Outcome::Closed { tag, deleted, .. } => vec![
                ("tag", tag.clone()),
                ("deleted", deleted.join(",")),
            ],
        }
    }
}

/// Drives one pull request's preview through gcloud and GitHub
pub struct PreviewAction<R: CommandRunner> {
    config: ActionConfig,
    gcloud: Gcloud<R>,
    github: GitHubClient,
}

impl<R: CommandRunner> PreviewAction<R> {
    pub fn new(config: ActionConfig, gcloud: Gcloud<R>, github: GitHubClient) -> Self {
        Self {
            config,
            gcloud,
            github,
        }
    }

    pub fn gcloud(&self) -> &Gcloud<R> {
        &self.gcloud
    }

    /// Log gcloud in with the credentials file left behind by an earlier
    /// auth step, if there is one.
    pub async fn authenticate(&self) -> Result<()> {
        match &self.config.credentials_file {
            Some(path) => {
                self.gcloud.authenticate(path).await?;
                info!("Successfully authenticated");
            }
            None => {
                warn!("No authentication found, authenticate with `google-github-actions/auth`.");
            }
        }
        Ok(())
    }

    pub async fn run(&self, mode: Mode, event: &PullRequestEvent) -> Result<Outcome> {
        let tag = self
            .config
            .tag
            .clone()
            .unwrap_or_else(|| generate_traffic_tag(event.number));

        let close = match mode {
            Mode::Open => false,
            Mode::Close => true,
            Mode::Auto => event.is_closed(),
        };
        if close {
            self.close(event.number, &tag).await
        } else {
            self.open(event.number, &tag).await
        }
    }

    /// Deploy the image as a tagged zero-traffic revision and comment the
    /// preview URL on pull request `number`.
    pub async fn open(&self, number: u64, tag: &str) -> Result<Outcome> {
        let config = &self.config;
        let image = config.image.as_deref().ok_or_else(|| {
            Error::configuration_with_context(
                "container image must be set",
                ErrorContext::new()
                    .with_field_path("INPUT_IMAGE")
                    .with_source("action_config"),
            )
        })?;
        let revision = config
            .revision
            .clone()
            .unwrap_or_else(|| generate_revision_name(&config.service, image));

        let mut manifest = self
            .gcloud
            .describe_service(&config.service, &config.region)
            .await?;
        info!("Successfully got the Cloud Run service: {}", config.service);

        // Must run before the template is renamed: a `latestRevision` entry
        // gets pinned to whatever the template names at this point.
        manifest.update_preview_traffic(&revision, tag)?;
        manifest.update_revision_name(&revision)?;
        manifest.update_image(image)?;

        let updated = self.gcloud.replace_service(&manifest, &config.region).await?;
        let url = updated.preview_url(tag);
        info!(revision = %revision, tag, url = ?url, "preview revision deployed");

        self.minimize_previous(number, tag).await;
        let body = comment::preview_body(&config.service, tag, &revision, url.as_deref());
        let posted = self
            .github
            .create_comment(&config.repository, number, &body)
            .await?;

        Ok(Outcome::Opened {
            revision,
            tag: tag.to_string(),
            url,
            comment_url: posted.html_url,
        })
    }

    /// Retire the preview tagged `tag`, optionally delete its revisions, and
    /// collapse the preview comments on pull request `number`.
    pub async fn close(&self, number: u64, tag: &str) -> Result<Outcome> {
        let config = &self.config;
        let mut manifest = self
            .gcloud
            .describe_service(&config.service, &config.region)
            .await?;

        let untagged = manifest.revisions_for_tag(tag);
        if untagged.is_empty() {
            info!(tag, "no traffic target carries the tag; nothing to remove");
            self.minimize_previous(number, tag).await;
            return Ok(Outcome::Closed {
                tag: tag.to_string(),
                untagged,
                deleted: Vec::new(),
            });
        }

        manifest.remove_tag(tag)?;
        let updated = self.gcloud.replace_service(&manifest, &config.region).await?;
        info!(tag, revisions = ?untagged, "preview tag removed");

        let mut deleted = Vec::new();
        if config.cleanup {
            // Revisions still referenced by the split, or still the latest
            // template, cannot be deleted.
            let still_used: Vec<String> = updated
                .spec_traffic()
                .into_iter()
                .chain(updated.traffic())
                .map(|t| t.revision_name)
                .chain(std::iter::once(updated.revision_name()))
                .collect();

            for revision in untagged.iter().filter(|r| !still_used.contains(r)) {
                match self.gcloud.delete_revision(revision, &config.region).await {
                    Ok(()) => {
                        info!(revision = %revision, "deleted preview revision");
                        deleted.push(revision.clone());
                    }
                    Err(e) => warn!(revision = %revision, error = %e, "failed to delete preview revision"),
                }
            }
        }

        self.minimize_previous(number, tag).await;
        let body = comment::teardown_body(&config.service, tag, &deleted);
        self.github
            .create_comment(&config.repository, number, &body)
            .await?;

        Ok(Outcome::Closed {
            tag: tag.to_string(),
            untagged,
            deleted,
        })
    }

    /// Collapse earlier preview comments for this service and tag. Failures
    /// are logged; they never fail the run.
    async fn minimize_previous(&self, number: u64, tag: &str) -> usize {
        let config = &self.config;
        let comments = match self.github.list_comments(&config.repository, number).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(error = %e, "failed to list pull request comments");
                return 0;
            }
        };

        let mut minimized = 0;
        for c in comments.iter().filter(|c| {
            c.body
                .as_deref()
                .is_some_and(|body| comment::is_preview_comment(body, &config.service, tag))
        }) {
            match self.github.minimize_comment(&c.node_id).await {
                Ok(()) => minimized += 1,
                Err(e) => warn!(comment = c.id, error = %e, "failed to minimize comment"),
            }
        }
        minimized
    }
}
