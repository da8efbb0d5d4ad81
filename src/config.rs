//! Engine configuration.
//!
//! An [`InlineConfig`] is built once (in code, or deserialized from JSON) and
//! handed to the [`Inliner`](crate::Inliner); it is never mutated afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DAY: Duration = Duration::from_secs(60 * 60 * 24);

/// Output serializer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMethod {
    #[default]
    Html,
    /// Parse and serialize as XHTML.
    Xml,
}

/// A legacy presentational attribute written alongside the inline style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMapping {
    pub attribute: String,
    /// Drop `px` units from the value, e.g. `width: 200px` → `width="200"`.
    #[serde(default)]
    pub strip_px: bool,
}

impl AttributeMapping {
    pub fn new(attribute: impl Into<String>, strip_px: bool) -> Self {
        Self {
            attribute: attribute.into(),
            strip_px,
        }
    }

    /// The attribute value for a CSS value.
    pub fn convert(&self, value: &str) -> String {
        let value = value.trim();
        if self.strip_px {
            value.replace("px", "")
        } else {
            value.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineConfig {
    /// Name of the cache backend, see [`cache::backend_by_name`](crate::cache::backend_by_name).
    pub cache_backend: String,
    pub css_parser_cache_key_prefix: String,
    #[serde(with = "duration_secs")]
    pub css_parser_cache_ttl: Duration,
    pub css_loader_cache_key_prefix: String,
    #[serde(with = "duration_secs")]
    pub css_loader_cache_ttl: Duration,
    /// CSS property → presentational attribute.
    pub css_to_html_attribute_mapping: BTreeMap<String, AttributeMapping>,
    /// Attributes from the mapping that must never be written.
    pub disabled_html_attributes: Vec<String>,
    /// Extra stylesheets applied after the ones referenced by the document.
    pub external_stylesheets: Vec<String>,
    /// Rewrite relative `href`/`src` against this URL.
    pub base_url: Option<String>,
    /// Local directory `<link>` paths and external stylesheets are read from.
    pub base_path: Option<PathBuf>,
    pub preserve_internal_links: bool,
    pub preserve_inline_attachments: bool,
    /// Leave `<style>` and `<link>` elements exactly as they were.
    pub keep_style_tags: bool,
    pub remove_classes: bool,
    /// Inline rules whose selector uses `*`.
    pub include_star_selectors: bool,
    /// Mark passed-through declarations `!important` so they still beat the
    /// inlined styles.
    pub important_passthrough: bool,
    pub method: OutputMethod,
    #[serde(with = "duration_secs")]
    pub fetch_timeout: Duration,
    /// Resolve elements on the rayon thread pool.
    pub parallel: bool,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self {
            cache_backend: "default".to_string(),
            css_parser_cache_key_prefix: "inlinify_parsed_css_".to_string(),
            css_parser_cache_ttl: DAY,
            css_loader_cache_key_prefix: "inlinify_css_contents_".to_string(),
            css_loader_cache_ttl: DAY,
            css_to_html_attribute_mapping: default_attribute_mapping(),
            disabled_html_attributes: Vec::new(),
            external_stylesheets: Vec::new(),
            base_url: None,
            base_path: None,
            preserve_internal_links: false,
            preserve_inline_attachments: true,
            keep_style_tags: false,
            remove_classes: false,
            include_star_selectors: false,
            important_passthrough: false,
            method: OutputMethod::Html,
            fetch_timeout: Duration::from_secs(10),
            parallel: true,
        }
    }
}

impl InlineConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The mapping for `property`, unless its attribute is disabled.
    pub fn attribute_for(&self, property: &str) -> Option<&AttributeMapping> {
        self.css_to_html_attribute_mapping
            .get(property)
            .filter(|m| !self.disabled_html_attributes.contains(&m.attribute))
    }
}

fn default_attribute_mapping() -> BTreeMap<String, AttributeMapping> {
    [
        ("text-align", "align", false),
        ("vertical-align", "valign", false),
        ("background-color", "bgcolor", false),
        ("width", "width", true),
        ("height", "height", true),
        ("cellspacing", "cellspacing", false),
        ("cellpadding", "cellpadding", false),
    ]
    .into_iter()
    .map(|(property, attribute, strip_px)| {
        (property.to_string(), AttributeMapping::new(attribute, strip_px))
    })
    .collect()
}

/// Durations as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InlineConfig::default();
        assert_eq!(config.cache_backend, "default");
        assert_eq!(config.css_parser_cache_ttl, DAY);
        assert!(config.preserve_inline_attachments);
        assert!(!config.include_star_selectors);
        assert_eq!(config.css_to_html_attribute_mapping.len(), 7);
        assert_eq!(
            config.attribute_for("background-color").map(|m| m.attribute.as_str()),
            Some("bgcolor")
        );
    }

    #[test]
    fn json_overrides_only_given_keys() {
        let config = InlineConfig::from_json(
            r#"{"css_parser_cache_ttl": 60, "method": "xml", "disabled_html_attributes": ["bgcolor"]}"#,
        )
        .unwrap();
        assert_eq!(config.css_parser_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.css_loader_cache_ttl, DAY);
        assert_eq!(config.method, OutputMethod::Xml);
        assert!(config.attribute_for("background-color").is_none());
        assert!(config.attribute_for("width").is_some());
    }

    #[test]
    fn strip_px_conversion() {
        assert_eq!(AttributeMapping::new("width", true).convert(" 200px "), "200");
        assert_eq!(AttributeMapping::new("align", false).convert(" center"), "center");
    }
}
