//! Preview comment bodies
//!
//! Every body starts with a hidden marker naming the service and tag, which
//! is how earlier preview comments are found again.

/// Hidden marker identifying preview comments for one service and tag
pub fn marker(service: &str, tag: &str) -> String {
    format!("<!-- preview-cloudrun:{}:{} -->", service, tag)
}

pub fn is_preview_comment(body: &str, service: &str, tag: &str) -> bool {
    body.contains(&marker(service, tag))
}

/// Comment announcing a freshly deployed preview
pub fn preview_body(service: &str, tag: &str, revision: &str, url: Option<&str>) -> String {
    let link = match url {
        Some(url) => format!("**Preview URL**: {}", url),
        None => "The preview URL is not available yet; check the service in the Cloud Run console."
            .to_string(),
    };
    format!(
        "{}\n### Cloud Run preview deployed\n\n\
         | Service | Revision | Tag |\n\
         |---------|----------|-----|\n\
         | `{}` | `{}` | `{}` |\n\n\
         {}\n",
        marker(service, tag),
        service,
        revision,
        tag,
        link
    )
}

/// Comment confirming that a preview was taken down
pub fn teardown_body(service: &str, tag: &str, deleted: &[String]) -> String {
    let mut body = format!(
        "{}\n### Cloud Run preview removed\n\nTag `{}` was removed from service `{}`.\n",
        marker(service, tag),
        tag,
        service
    );
    if !deleted.is_empty() {
        body.push_str("\nDeleted revisions:\n");
        for revision in deleted {
            body.push_str(&format!("- `{}`\n", revision));
        }
    }
    body
}
