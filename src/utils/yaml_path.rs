//! Dot-notation path access over a YAML document tree
//!
//! Paths look like `spec.template.spec.containers[0].image`. Reads are
//! null-tolerant: any missing segment yields `None`. Writes only descend
//! through structure that already exists, so a write can never invent a
//! partial service document.

use serde_yaml::Value;

/// Path access error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Cannot set value at path: {0}")]
    CannotSetValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn parse_segments(path: &str) -> Result<Vec<Segment<'_>>, PathError> {
    let normalized = path.trim().trim_start_matches("$.");
    if normalized.is_empty() {
        return Err(PathError::InvalidPath("Empty path".to_string()));
    }

    let mut segments = Vec::new();
    for part in normalized.split('.') {
        if part.is_empty() {
            return Err(PathError::InvalidPath(format!("Empty segment in '{}'", path)));
        }

        // "containers[0]" -> key "containers", index 0 (indices may repeat: "a[0][1]")
        let (key, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }
        while !rest.is_empty() {
            let close = rest
                .find(']')
                .ok_or_else(|| PathError::InvalidPath(format!("Unclosed index in '{}'", path)))?;
            let idx = rest[1..close]
                .trim()
                .parse::<usize>()
                .map_err(|_| PathError::InvalidPath(format!("Bad index in '{}'", path)))?;
            segments.push(Segment::Index(idx));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(PathError::InvalidPath(format!(
                    "Unexpected text after index in '{}'",
                    path
                )));
            }
        }
    }
    Ok(segments)
}

fn step<'a>(current: &'a Value, segment: &Segment<'_>) -> Option<&'a Value> {
    match (segment, current) {
        (Segment::Key(key), Value::Mapping(map)) => map.get(*key),
        (Segment::Index(idx), Value::Sequence(seq)) => seq.get(*idx),
        _ => None,
    }
}

fn step_mut<'a>(current: &'a mut Value, segment: &Segment<'_>) -> Option<&'a mut Value> {
    match (segment, current) {
        (Segment::Key(key), Value::Mapping(map)) => map.get_mut(*key),
        (Segment::Index(idx), Value::Sequence(seq)) => seq.get_mut(*idx),
        _ => None,
    }
}

/// Path reader/writer for `serde_yaml::Value` trees
pub struct YamlPath;

impl YamlPath {
    /// Get the node at `path`; `None` when any segment is absent or the path
    /// is malformed. An explicit YAML `null` counts as absent.
    pub fn get<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
        let segments = parse_segments(path).ok()?;
        let mut current = doc;
        for segment in &segments {
            current = step(current, segment)?;
        }
        match current {
            Value::Null => None,
            other => Some(other),
        }
    }

    /// Mutable counterpart of [`YamlPath::get`].
    pub fn get_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Value> {
        let segments = parse_segments(path).ok()?;
        let mut current = doc;
        for segment in &segments {
            current = step_mut(current, segment)?;
        }
        if current.is_null() {
            return None;
        }
        Some(current)
    }

    /// Get a scalar at `path` rendered as a string (numbers and booleans are
    /// stringified). Sequences and mappings yield `None`.
    pub fn get_string(doc: &Value, path: &str) -> Option<String> {
        Self::get(doc, path).and_then(scalar_to_string)
    }

    /// Get a sequence at `path`.
    pub fn get_sequence<'a>(doc: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
        Self::get(doc, path).and_then(Value::as_sequence)
    }

    /// Set `value` at `path`. Every segment but the last must already exist;
    /// the last one is inserted (mapping key) or overwritten (sequence index).
    pub fn set(doc: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
        let segments = parse_segments(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| PathError::InvalidPath("No last segment".to_string()))?;

        let mut current = doc;
        for segment in parents {
            current = step_mut(current, segment).ok_or_else(|| {
                PathError::CannotSetValue(format!("{} (missing parent)", path))
            })?;
        }

        match (last, current) {
            (Segment::Key(key), Value::Mapping(map)) => {
                map.insert(Value::String((*key).to_string()), value);
                Ok(())
            }
            (Segment::Index(idx), Value::Sequence(seq)) => match seq.get_mut(*idx) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(PathError::CannotSetValue(format!(
                    "{} (index out of bounds)",
                    path
                ))),
            },
            _ => Err(PathError::CannotSetValue(format!(
                "{} (parent has the wrong shape)",
                path
            ))),
        }
    }
}

/// Render a YAML scalar as a string. Null and collections yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// JavaScript-style truthiness of a YAML node, used where the manifest
/// semantics treat `0`, `""`, `false` and `null` as "not set".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => true,
    }
}
