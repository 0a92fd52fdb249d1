//! Cloud Run service manifest
//!
//! The whole document is kept as a YAML tree so that fields this tool never
//! looks at survive the describe → mutate → replace round trip. Typed access
//! is limited to the handful of paths the preview flow needs.

use serde_yaml::Value;

use super::error::ManifestError;
use super::traffic::{rebuild_preview_traffic, without_tag, TrafficTarget};
use crate::utils::YamlPath;

const API_VERSION: &str = "apiVersion";
const SERVICE_NAME: &str = "metadata.name";
const REVISION_NAME: &str = "spec.template.metadata.name";
const IMAGE: &str = "spec.template.spec.containers[0].image";
const SPEC_TRAFFIC: &str = "spec.traffic";
const STATUS_TRAFFIC: &str = "status.traffic";
const SERVICE_URL: &str = "status.url";

/// A parsed `serving.knative.dev/v1` Service document
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceManifest {
    document: Value,
}

impl ServiceManifest {
    pub(crate) fn from_document(document: Value) -> Self {
        Self { document }
    }

    /// The underlying document tree
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    pub fn api_version(&self) -> String {
        self.read(API_VERSION)
    }

    pub fn service_name(&self) -> String {
        self.read(SERVICE_NAME)
    }

    /// Image of the first container in the revision template
    pub fn image(&self) -> String {
        self.read(IMAGE)
    }

    /// Name the next revision will be created with
    pub fn revision_name(&self) -> String {
        self.read(REVISION_NAME)
    }

    /// Main URL of the service, as observed by the platform
    pub fn service_url(&self) -> String {
        self.read(SERVICE_URL)
    }

    /// Observed traffic split (`status.traffic`). Empty when the service has
    /// not reported any yet.
    pub fn traffic(&self) -> Vec<TrafficTarget> {
        YamlPath::get_sequence(&self.document, STATUS_TRAFFIC)
            .map(|entries| entries.iter().map(TrafficTarget::from_status_value).collect())
            .unwrap_or_default()
    }

    /// Desired traffic split (`spec.traffic`)
    pub fn spec_traffic(&self) -> Vec<TrafficTarget> {
        YamlPath::get_sequence(&self.document, SPEC_TRAFFIC)
            .map(|entries| entries.iter().map(TrafficTarget::from_value).collect())
            .unwrap_or_default()
    }

    /// Revisions currently holding `tag` in the desired split
    pub fn revisions_for_tag(&self, tag: &str) -> Vec<String> {
        self.spec_traffic()
            .into_iter()
            .filter(|t| t.has_tag(tag) && !t.revision_name.is_empty())
            .map(|t| t.revision_name)
            .collect()
    }

    /// URL under which the revision tagged `tag` is reachable.
    ///
    /// Prefers the URL the platform reported for the tag; otherwise derives
    /// `https://<tag>---<service host>` from `status.url`.
    pub fn preview_url(&self, tag: &str) -> Option<String> {
        if let Some(url) = self
            .traffic()
            .into_iter()
            .find(|t| t.has_tag(tag))
            .and_then(|t| t.url)
        {
            return Some(url);
        }

        let service_url = url::Url::parse(&self.service_url()).ok()?;
        let host = service_url.host_str()?;
        Some(format!("{}://{}---{}", service_url.scheme(), tag, host))
    }

    /// Give `revision` the traffic tag `tag`, taking it away from whichever
    /// revision held it before. Serving entries keep their shares; a
    /// `latestRevision` entry is pinned to the current template revision.
    pub fn update_preview_traffic(&mut self, revision: &str, tag: &str) -> Result<(), ManifestError> {
        let entries = self.spec_traffic_entries()?;
        let template_revision = self.revision_name();
        let next = rebuild_preview_traffic(entries, Some(&template_revision), revision, tag);

        let next = serde_yaml::to_value(next).map_err(|e| ManifestError::Serialize(e.to_string()))?;
        self.write_spec_traffic(next)
    }

    /// Remove every desired-traffic entry tagged `tag`
    pub fn remove_tag(&mut self, tag: &str) -> Result<(), ManifestError> {
        let next = without_tag(self.spec_traffic_entries()?, tag);
        self.write_spec_traffic(Value::Sequence(next))
    }

    /// Rename the revision the next deployment will create
    pub fn update_revision_name(&mut self, revision: &str) -> Result<(), ManifestError> {
        if self.revision_name().is_empty() {
            return Err(ManifestError::not_found("revision name"));
        }
        YamlPath::set(&mut self.document, REVISION_NAME, Value::from(revision))
            .map_err(|_| ManifestError::not_found("revision name"))
    }

    /// Replace the image of the first container in the revision template
    pub fn update_image(&mut self, image: &str) -> Result<(), ManifestError> {
        if self.image().is_empty() {
            return Err(ManifestError::not_found("image"));
        }
        YamlPath::set(&mut self.document, IMAGE, Value::from(image))
            .map_err(|_| ManifestError::not_found("image"))
    }

    /// Serialize the whole document back to YAML
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        serde_yaml::to_string(&self.document).map_err(|e| ManifestError::Serialize(e.to_string()))
    }

    fn read(&self, path: &str) -> String {
        YamlPath::get_string(&self.document, path).unwrap_or_default()
    }

    fn spec_traffic_entries(&self) -> Result<&[Value], ManifestError> {
        YamlPath::get_sequence(&self.document, SPEC_TRAFFIC)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ManifestError::missing_field(SPEC_TRAFFIC)
                    .with_hint("describe the service with --format yaml to include spec.traffic")
            })
    }

    fn write_spec_traffic(&mut self, traffic: Value) -> Result<(), ManifestError> {
        YamlPath::set(&mut self.document, SPEC_TRAFFIC, traffic)
            .map_err(|_| ManifestError::missing_field(SPEC_TRAFFIC))
    }
}
