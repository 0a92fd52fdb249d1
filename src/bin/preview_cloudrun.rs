//! preview-cloudrun: pull-request previews for Cloud Run, run as a GitHub Actions step
//!
//! Usage:
//!   preview-cloudrun [auto]     Open or close depending on the pull_request event action
//!   preview-cloudrun open       Deploy the tagged preview revision and comment its URL
//!   preview-cloudrun close      Remove the preview tag and clean up

use std::io::Write;

use anyhow::Context;
use preview_cloudrun::gcloud::Gcloud;
use preview_cloudrun::github::{GitHubClient, PullRequestEvent};
use preview_cloudrun::{ActionConfig, Mode, Outcome, PreviewAction};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("auto");

    let mode = match command {
        "version" | "--version" | "-V" => return cmd_version(),
        "help" | "--help" | "-h" => return print_usage(),
        other => match other.parse::<Mode>() {
            Ok(mode) => mode,
            Err(_) => {
                eprintln!("Unknown command: {other}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(mode).await {
        // Workflow command: marks the step as failed with an annotation.
        println!("::error::preview-cloudrun failed with: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"preview-cloudrun - Cloud Run pull-request previews

USAGE:
    preview-cloudrun [COMMAND]

COMMANDS:
    auto        Open or close, following the pull_request event action (default)
    open        Deploy a tagged zero-traffic revision and comment its URL
    close       Remove the preview tag, delete preview revisions, minimize comments
    version     Show version information
    help        Show this help message

INPUTS (environment):
    INPUT_SERVICE, INPUT_IMAGE, INPUT_TOKEN, INPUT_REGION, INPUT_PROJECT,
    INPUT_REVISION, INPUT_TAG, INPUT_CLEANUP, INPUT_GCLOUD_PATH
    GOOGLE_GHA_CREDS_PATH       Credentials file from google-github-actions/auth
    RUST_LOG                    Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("preview-cloudrun {}", env!("CARGO_PKG_VERSION"));
}

async fn run(mode: Mode) -> anyhow::Result<()> {
    let config = ActionConfig::from_env()?;
    let event_path = config
        .event_path
        .clone()
        .context("GITHUB_EVENT_PATH must be set")?;
    let event = PullRequestEvent::from_path(&event_path)
        .with_context(|| format!("failed to read event payload {}", event_path.display()))?;

    let gcloud = Gcloud::new(config.gcloud_options());
    let github = GitHubClient::new(&config.token, &config.api_url, &config.graphql_url)?;
    let action = PreviewAction::new(config, gcloud, github);

    action.authenticate().await?;
    let outcome = action.run(mode, &event).await?;

    match &outcome {
        Outcome::Opened { url, .. } => {
            info!("Preview available at {}", url.as_deref().unwrap_or("(unknown)"))
        }
        Outcome::Closed { tag, .. } => info!("Preview {} removed", tag),
    }
    write_outputs(&outcome)?;
    Ok(())
}

/// Append step outputs to `$GITHUB_OUTPUT` when running inside Actions
fn write_outputs(outcome: &Outcome) -> anyhow::Result<()> {
    let Ok(path) = std::env::var("GITHUB_OUTPUT") else {
        return Ok(());
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path))?;
    for (name, value) in outcome.outputs() {
        writeln!(file, "{}={}", name, value)?;
    }
    Ok(())
}
