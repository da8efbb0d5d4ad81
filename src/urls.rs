//! Absolutizing `href` and `src` attributes.

use dom::Dom;
use url::Url;

use crate::config::InlineConfig;
use crate::error::{InlineError, Result};

/// Parse the configured base URL as a directory: a missing trailing `/` is
/// added so relative links resolve beneath it.
pub fn parse_base_url(base: &str) -> Result<Url> {
    let mut normalized = base.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|source| InlineError::InvalidBaseUrl {
        url: base.to_string(),
        source,
    })
}

/// Rewrite every `href` and `src` against `base`.
///
/// Links with a scheme (`mailto:`, `https:`) are kept. `#fragment` links
/// survive with `preserve_internal_links`, `cid:` sources with
/// `preserve_inline_attachments`.
pub fn rewrite_urls(dom: &mut Dom, base: &Url, config: &InlineConfig) {
    for id in dom.elements() {
        let Some(element) = dom.element_mut(id) else {
            continue;
        };
        for attr in ["href", "src"] {
            let Some(value) = element.attr(attr) else {
                continue;
            };
            if attr == "href" && config.preserve_internal_links && value.starts_with('#') {
                continue;
            }
            if attr == "src" && config.preserve_inline_attachments && value.starts_with("cid:") {
                continue;
            }
            match absolutize(base, value) {
                Some(url) => element.set_attr(attr, url),
                None => tracing::debug!(attr, value, "leaving unresolvable url"),
            }
        }
    }
}

fn absolutize(base: &Url, value: &str) -> Option<String> {
    // Root-relative paths resolve under the base, not at its host root.
    let relative = if value.starts_with("//") {
        value
    } else {
        value.trim_start_matches('/')
    };
    base.join(relative).ok().map(String::from)
}
