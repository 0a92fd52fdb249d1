//! Manifest parsing

use std::str::FromStr;

use serde_yaml::Value;

use super::error::ManifestError;
use super::service::ServiceManifest;

/// Parse a service manifest from YAML text.
///
/// Empty input and the empty collections `{}` / `[]` are rejected, as is a
/// document whose root is not a mapping. Errors carry the offending text.
pub fn parse_service_manifest(data: &str) -> Result<ServiceManifest, ManifestError> {
    let data = data.trim();
    if data.is_empty() || data == "{}" || data == "[]" {
        return Err(ManifestError::parse("the data must be set", data));
    }

    let document: Value =
        serde_yaml::from_str(data).map_err(|e| ManifestError::parse(e.to_string(), data))?;
    if !document.is_mapping() {
        return Err(ManifestError::parse("the document root must be a mapping", data));
    }

    Ok(ServiceManifest::from_document(document))
}

/// Skip whatever a CLI printed before the manifest itself, i.e. everything
/// up to the first line that starts with `apiVersion:`.
pub fn strip_preamble(stdout: &str) -> &str {
    let mut offset = 0;
    for line in stdout.split_inclusive('\n') {
        if line.starts_with("apiVersion:") {
            return &stdout[offset..];
        }
        offset += line.len();
    }
    stdout
}

impl FromStr for ServiceManifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_service_manifest(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_documents() {
        for input in ["", "   \n\t", "{}", " [] \n"] {
            let err = parse_service_manifest(input).unwrap_err();
            assert!(matches!(err, ManifestError::Parse { .. }), "input {:?}", input);
        }
    }

    #[test]
    fn wraps_decode_errors_with_the_input() {
        let err = parse_service_manifest("apiVersion: [unterminated").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("failed to parse service manifest: "));
        assert!(msg.ends_with("stdout: apiVersion: [unterminated"));
    }

    #[test]
    fn rejects_scalar_roots() {
        assert!(matches!(
            parse_service_manifest("just text"),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn strips_cli_progress_output() {
        let stdout = "Applying new configuration...\nDone.\napiVersion: serving.knative.dev/v1\nkind: Service\n";
        assert_eq!(
            strip_preamble(stdout),
            "apiVersion: serving.knative.dev/v1\nkind: Service\n"
        );
        assert_eq!(strip_preamble("kind: Service\n"), "kind: Service\n");

        let manifest: ServiceManifest = strip_preamble(stdout).parse().unwrap();
        assert_eq!(manifest.api_version(), "serving.knative.dev/v1");
    }
}
