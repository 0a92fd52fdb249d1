//! Revision and tag names

use once_cell::sync::Lazy;
use regex::Regex;

/// Cloud Run caps revision names at 63 characters (DNS label).
const MAX_REVISION_NAME_LEN: usize = 63;
const DIGEST_PREFIX_LEN: usize = 12;

static INVALID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]+").expect("static regex is valid"));
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("static regex is valid"));

/// Derive a revision name from the service and the image being previewed:
/// `<service>-<image tag>`, or `<service>-<digest prefix>` for digest
/// references.
pub fn generate_revision_name(service: &str, image: &str) -> String {
    let service = service.trim_end_matches('-');
    let mut suffix = sanitize(image_version(image));
    if suffix.is_empty() {
        suffix = "latest".to_string();
    }

    // Only the suffix is shortened: the `<service>-` prefix is mandatory.
    // At least one suffix character always survives.
    let room = MAX_REVISION_NAME_LEN
        .saturating_sub(service.len() + 1)
        .max(1);
    // sanitized suffixes are ASCII, so byte truncation is safe
    suffix.truncate(room);
    format!("{}-{}", service, suffix.trim_end_matches('-'))
}

/// Tag identifying the preview of pull request `number`
pub fn generate_traffic_tag(number: u64) -> String {
    format!("pr{}", number)
}

fn image_version(image: &str) -> &str {
    if let Some((_, digest)) = image.split_once('@') {
        let hex = digest.split_once(':').map_or(digest, |(_, hex)| hex);
        let end = hex
            .char_indices()
            .nth(DIGEST_PREFIX_LEN)
            .map_or(hex.len(), |(i, _)| i);
        return &hex[..end];
    }
    // a ':' before the last '/' belongs to a registry port
    let last_component = image.rsplit('/').next().unwrap_or(image);
    match last_component.rsplit_once(':') {
        Some((_, tag)) => tag,
        None => "",
    }
}

fn sanitize(raw: &str) -> String {
    let lowered = raw.to_ascii_lowercase();
    let replaced = INVALID_CHARS.replace_all(&lowered, "-");
    DASH_RUNS
        .replace_all(&replaced, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_the_image_tag() {
        assert_eq!(
            generate_revision_name("helloworld", "gcr.io/cloudrun/hello:v0.1.2"),
            "helloworld-v0-1-2"
        );
        assert_eq!(
            generate_revision_name("app", "localhost:5000/team/app:Feature_X"),
            "app-feature-x"
        );
    }

    #[test]
    fn falls_back_for_untagged_and_digest_images() {
        assert_eq!(generate_revision_name("app", "localhost:5000/team/app"), "app-latest");
        assert_eq!(
            generate_revision_name(
                "app",
                "gcr.io/p/app@sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
            ),
            "app-9f86d081884c"
        );
    }

    #[test]
    fn truncates_to_a_dns_label() {
        let name = generate_revision_name(&"s".repeat(60), "img:abc-def");
        assert!(name.len() <= MAX_REVISION_NAME_LEN);
        assert!(!name.ends_with('-'));
        assert!(name.starts_with(&"s".repeat(60)));
    }

    #[test]
    fn truncation_keeps_the_service_prefix() {
        // the cut lands right after a '-' in the suffix
        let service = "s".repeat(59);
        let name = generate_revision_name(&service, "img:ab-cd");
        assert_eq!(name, format!("{}-ab", service));

        // no room left for the suffix: the prefix still wins
        let service = "s".repeat(62);
        let name = generate_revision_name(&service, "img:v1");
        assert!(name.starts_with(&format!("{}-", service)));
        assert_ne!(name, service);
    }

    #[test]
    fn tags_pull_requests() {
        assert_eq!(generate_traffic_tag(42), "pr42");
    }
}
