//! Traffic targets and the traffic-list rewrites
//!
//! A Cloud Run service splits traffic between revisions through an ordered
//! list of targets. Each target names a revision (or "latest"), an optional
//! percent share, and an optional tag giving the revision its own URL.
//! Preview revisions are tagged targets with no percent.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::utils::{is_truthy, scalar_to_string};

/// One traffic allocation entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_revision: Option<bool>,
}

impl TrafficTarget {
    /// A target pointing at a concrete revision, with no share and no tag.
    pub fn revision(name: impl Into<String>) -> Self {
        Self {
            revision_name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_percent(mut self, percent: u32) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Project a raw YAML entry. Falsy members (`0`, `""`, `null`, `false`)
    /// are omitted rather than defaulted.
    pub fn from_value(entry: &Value) -> Self {
        let member = |key: &str| entry.get(key).filter(|v| is_truthy(v));

        Self {
            percent: member("percent").and_then(coerce_percent),
            revision_name: entry
                .get("revisionName")
                .and_then(scalar_to_string)
                .unwrap_or_default(),
            tag: member("tag").and_then(scalar_to_string),
            url: member("url").and_then(scalar_to_string),
            latest_revision: member("latestRevision").map(|_| true),
        }
    }

    /// The same projection, restricted to what an observed status entry
    /// carries.
    pub(crate) fn from_status_value(entry: &Value) -> Self {
        Self {
            latest_revision: None,
            ..Self::from_value(entry)
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }
}

/// Numeric coercion for `percent`: YAML numbers as-is, numeric strings
/// parsed. Anything else, or a share that rounds below 1, yields `None`.
fn coerce_percent(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Tagged(tagged) => return coerce_percent(&tagged.value),
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    // shares are whole percents; one that rounds to zero is no share at all
    let rounded = number.round();
    if rounded >= 1.0 {
        Some(rounded as u32)
    } else {
        None
    }
}

/// Rebuild a `spec.traffic` list so that `revision` alone owns `tag`.
///
/// - a `latestRevision` entry is pinned to `template_revision` at 100%, when
///   that name is known;
/// - entries with a share, or with a different tag, are kept stripped to
///   `{percent, tag, revisionName}`; a serving entry that held `tag` keeps
///   its share but loses the tag;
/// - everything else (the previous holder of `tag`, bare placeholders) is
///   dropped;
/// - `{revisionName: revision, tag}` is appended.
pub fn rebuild_preview_traffic(
    entries: &[Value],
    template_revision: Option<&str>,
    revision: &str,
    tag: &str,
) -> Vec<TrafficTarget> {
    let template_revision = template_revision.filter(|name| !name.is_empty());
    let mut next = Vec::with_capacity(entries.len() + 1);

    for entry in entries {
        let target = TrafficTarget::from_value(entry);

        if target.latest_revision.is_some() {
            if let Some(name) = template_revision {
                next.push(TrafficTarget::revision(name).with_percent(100));
                continue;
            }
        }

        let other_tag = target.tag.as_deref().is_some_and(|t| t != tag);
        if target.percent.is_some() || other_tag {
            next.push(TrafficTarget {
                percent: target.percent,
                // An unpinned "latest" entry has no revision name to keep.
                latest_revision: if target.revision_name.is_empty() {
                    target.latest_revision
                } else {
                    None
                },
                revision_name: target.revision_name,
                tag: if other_tag { target.tag } else { None },
                url: None,
            });
        }
    }

    next.push(TrafficTarget::revision(revision).with_tag(tag));
    next
}

/// Drop every entry whose tag equals `tag`; all other entries pass through
/// untouched, unknown keys included.
pub fn without_tag(entries: &[Value], tag: &str) -> Vec<Value> {
    entries
        .iter()
        .filter(|entry| {
            entry.get("tag").and_then(scalar_to_string).as_deref() != Some(tag)
        })
        .cloned()
        .collect()
}
