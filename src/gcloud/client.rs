use std::path::Path;

use tracing::{debug, info};

use super::runner::{CommandRunner, TokioCommandRunner};
use crate::manifest::{parse_service_manifest, strip_preamble, ServiceManifest};
use crate::{Error, Result};

/// Options for the gcloud wrapper
#[derive(Debug, Clone)]
pub struct GcloudOptions {
    /// Project passed as `--project`; gcloud's configured default otherwise
    pub project_id: Option<String>,
    /// Program to run, `gcloud` unless the SDK lives off `PATH`
    pub tool_command: String,
}

impl Default for GcloudOptions {
    fn default() -> Self {
        Self {
            project_id: None,
            tool_command: "gcloud".to_string(),
        }
    }
}

/// Thin wrapper over the `gcloud run` commands the preview flow needs
pub struct Gcloud<R = TokioCommandRunner> {
    runner: R,
    tool_command: String,
    project_id: Option<String>,
}

impl Gcloud<TokioCommandRunner> {
    pub fn new(options: GcloudOptions) -> Self {
        Self::with_runner(TokioCommandRunner, options)
    }
}

impl<R: CommandRunner> Gcloud<R> {
    pub fn with_runner(runner: R, options: GcloudOptions) -> Self {
        Self {
            runner,
            tool_command: options.tool_command,
            project_id: options.project_id.filter(|p| !p.is_empty()),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Activate a service-account or workload-identity credential file
    pub async fn authenticate(&self, credentials_file: &Path) -> Result<()> {
        let args = vec![
            "--quiet".to_string(),
            "auth".to_string(),
            "login".to_string(),
            "--cred-file".to_string(),
            credentials_file.to_string_lossy().into_owned(),
        ];
        self.exec(args).await?;
        Ok(())
    }

    /// `gcloud run services describe` as a manifest
    pub async fn describe_service(&self, service: &str, region: &str) -> Result<ServiceManifest> {
        let mut args = to_args(&["run", "services", "describe", service, "--quiet"]);
        args.extend(to_args(&["--region", region, "--format", "yaml"]));
        self.push_project(&mut args);

        let stdout = self.exec(args).await?;
        Ok(parse_service_manifest(&stdout)?)
    }

    /// Submit `manifest` with `gcloud run services replace` and return the
    /// service as the platform reports it afterwards.
    pub async fn replace_service(
        &self,
        manifest: &ServiceManifest,
        region: &str,
    ) -> Result<ServiceManifest> {
        let data = manifest.to_yaml()?;
        // The guard removes the directory on drop, cancellation included.
        let temp_dir = tempfile::Builder::new()
            .prefix("preview-cloudrun-")
            .tempdir()?;
        let file = temp_dir.path().join("service.yaml");

        let result = self.replace_from_file(&file, &data, region).await;

        let dir = temp_dir.path().to_path_buf();
        if let Err(e) = temp_dir.close() {
            debug!(dir = %dir.display(), error = %e, "failed to remove temporary directory");
        }
        result
    }

    async fn replace_from_file(
        &self,
        file: &Path,
        data: &str,
        region: &str,
    ) -> Result<ServiceManifest> {
        tokio::fs::write(file, data).await?;
        info!("submitting service manifest:\n{}", data);

        let mut args = to_args(&["run", "services", "replace"]);
        args.push(file.to_string_lossy().into_owned());
        args.extend(to_args(&["--quiet", "--region", region, "--format", "yaml"]));
        self.push_project(&mut args);

        let stdout = self.exec(args).await?;
        Ok(parse_service_manifest(strip_preamble(&stdout))?)
    }

    /// Delete one revision
    pub async fn delete_revision(&self, revision: &str, region: &str) -> Result<()> {
        let mut args = to_args(&["run", "revisions", "delete", revision, "--quiet"]);
        args.extend(to_args(&["--region", region]));
        self.push_project(&mut args);

        self.exec(args).await?;
        Ok(())
    }

    fn push_project(&self, args: &mut Vec<String>) {
        if let Some(project) = &self.project_id {
            args.push("--project".to_string());
            args.push(project.clone());
        }
    }

    /// Run the tool and return its stdout; a non-zero exit is an error
    /// carrying stderr.
    async fn exec(&self, args: Vec<String>) -> Result<String> {
        let command = format!("{} {}", self.tool_command, args.join(" "));
        let output = self
            .runner
            .run(&self.tool_command, &args)
            .await
            .map_err(|e| Error::Command {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.success() {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                format!(
                    "command exited {}, but stderr had no output",
                    output.exit_code
                )
            } else {
                stderr.to_string()
            };
            return Err(Error::Command { command, message });
        }

        Ok(output.stdout)
    }
}

fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
