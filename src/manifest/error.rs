//! Manifest error types

fn format_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n Hint: {}", h))
        .unwrap_or_default()
}

/// Errors raised by the manifest parser and mutators
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to parse service manifest: {reason}, stdout: {data}")]
    Parse { reason: String, data: String },

    #[error("failed to get the .{path} field{}", format_hint(.hint))]
    MissingField { path: String, hint: Option<String> },

    #[error("failed to get the {field}{}", format_hint(.hint))]
    NotFound { field: String, hint: Option<String> },

    #[error("failed to serialize service manifest: {0}")]
    Serialize(String),
}

impl ManifestError {
    pub(crate) fn parse(reason: impl Into<String>, data: impl Into<String>) -> Self {
        ManifestError::Parse {
            reason: reason.into(),
            data: data.into(),
        }
    }

    pub(crate) fn missing_field(path: impl Into<String>) -> Self {
        ManifestError::MissingField {
            path: path.into(),
            hint: None,
        }
    }

    pub(crate) fn not_found(field: impl Into<String>) -> Self {
        ManifestError::NotFound {
            field: field.into(),
            hint: None,
        }
    }

    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            ManifestError::MissingField { ref mut hint, .. } => *hint = hint_val,
            ManifestError::NotFound { ref mut hint, .. } => *hint = hint_val,
            _ => (),
        }
        self
    }
}
