//! GitHub collaborator: pull-request events and preview comments.

pub mod client;
pub mod comment;
pub mod event;

pub use client::{GitHubClient, GitHubError, IssueComment, Repository};
pub use event::PullRequestEvent;
