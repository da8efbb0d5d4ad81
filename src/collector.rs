//! Finding the CSS a document uses.
//!
//! `<style>` elements and `<link rel="stylesheet">` references are
//! collected in document order, followed by the configured external
//! stylesheets. Linked and external sheets are loaded through a
//! [`StylesheetFetcher`], with their text cached by the location the
//! fetcher reads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dom::{Dom, NodeId};
use url::Url;

use crate::cache::{CacheAdapter, content_key};
use crate::config::InlineConfig;
use crate::error::{CacheError, Diagnostic, FetchError};

/// Loads the text of an external stylesheet.
///
/// Implementations must give up after `timeout` and must be shareable
/// between threads.
pub trait StylesheetFetcher: Send + Sync {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;

    /// Identity of the resource `url` names, used as the loader cache key.
    /// Fetchers that read different content for the same `url` depending on
    /// their own setup must fold that setup into the key.
    fn cache_key(&self, url: &str) -> String {
        url.to_string()
    }
}

impl<F> StylesheetFetcher for F
where
    F: Fn(&str, Duration) -> Result<String, FetchError> + Send + Sync,
{
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        self(url, timeout)
    }
}

/// Refuses every fetch.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFetcher;

impl StylesheetFetcher for NoFetcher {
    fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        Err(FetchError::Unsupported(url.to_string()))
    }
}

/// Reads `file://` URLs and plain paths from disk. Relative paths are
/// resolved against `root` when one is set.
#[derive(Debug, Default, Clone)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn path_for(&self, location: &str) -> Result<PathBuf, FetchError> {
        if let Ok(url) = Url::parse(location) {
            return match url.scheme() {
                "file" => url
                    .to_file_path()
                    .map_err(|()| FetchError::Unsupported(location.to_string())),
                _ => Err(FetchError::Unsupported(location.to_string())),
            };
        }
        let path = Path::new(location);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl StylesheetFetcher for FileFetcher {
    fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        let path = self.path_for(url)?;
        Ok(std::fs::read_to_string(path)?)
    }

    fn cache_key(&self, url: &str) -> String {
        match self.path_for(url) {
            Ok(path) => {
                let path = std::path::absolute(&path).unwrap_or(path);
                format!("file:{}", path.display())
            }
            Err(_) => url.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collection
// ─────────────────────────────────────────────────────────────────────────────

/// Where a piece of CSS came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// A `<style>` element.
    Style(NodeId),
    /// A `<link rel="stylesheet">` element.
    Link { node: NodeId, url: String },
    /// A stylesheet from [`InlineConfig::external_stylesheets`].
    External { url: String },
}

#[derive(Debug, Clone)]
pub struct CssSource {
    pub text: Arc<str>,
    pub origin: SourceOrigin,
}

#[derive(Debug, Default)]
pub struct Collection {
    /// In cascade order.
    pub sources: Vec<CssSource>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct StylesheetCollector<'a> {
    config: &'a InlineConfig,
    base_url: Option<&'a Url>,
    fetcher: &'a dyn StylesheetFetcher,
    cache: &'a CacheAdapter,
}

impl<'a> StylesheetCollector<'a> {
    pub fn new(
        config: &'a InlineConfig,
        base_url: Option<&'a Url>,
        fetcher: &'a dyn StylesheetFetcher,
        cache: &'a CacheAdapter,
    ) -> Self {
        Self {
            config,
            base_url,
            fetcher,
            cache,
        }
    }

    pub fn collect(&self, dom: &Dom) -> Collection {
        let mut collection = Collection::default();

        for id in dom.elements() {
            let Some(element) = dom.element(id) else {
                continue;
            };
            let is_sheet = match element.tag_name() {
                "style" => is_css_type(element.attr("type")),
                "link" => is_stylesheet_link(element.attr("rel")),
                _ => false,
            };
            if !is_sheet {
                continue;
            }
            if !applies_to_screen(element.attr("media")) {
                tracing::debug!(tag = element.tag_name(), "skipping non-screen stylesheet");
                continue;
            }
            match element.tag_name() {
                "style" => {
                    collection.sources.push(CssSource {
                        text: Arc::from(dom.text_content(id)),
                        origin: SourceOrigin::Style(id),
                    });
                }
                "link" => {
                    let Some(href) = element.attr("href") else {
                        continue;
                    };
                    let url = self.resolve(href);
                    self.load_into(&mut collection, url, |url| SourceOrigin::Link { node: id, url });
                }
                _ => {}
            }
        }

        for location in &self.config.external_stylesheets {
            self.load_into(&mut collection, location.clone(), |url| {
                SourceOrigin::External { url }
            });
        }

        tracing::debug!(
            sources = collection.sources.len(),
            failures = collection.diagnostics.len(),
            "collected stylesheets"
        );
        collection
    }

    fn load_into(
        &self,
        collection: &mut Collection,
        url: String,
        origin: impl FnOnce(String) -> SourceOrigin,
    ) {
        match self.load(&url) {
            Ok((text, cache_error)) => {
                if let Some(err) = cache_error {
                    collection.diagnostics.push(err.into());
                }
                collection.sources.push(CssSource {
                    text,
                    origin: origin(url),
                });
            }
            Err(source) => {
                tracing::warn!(%url, %source, "stylesheet not loaded");
                collection
                    .diagnostics
                    .push(Diagnostic::FetchFailure { url, source });
            }
        }
    }

    fn load(&self, url: &str) -> Result<(Arc<str>, Option<CacheError>), FetchError> {
        let key = content_key(
            &self.config.css_loader_cache_key_prefix,
            &self.fetcher.cache_key(url),
        );
        let lookup = self
            .cache
            .try_get_or_compute(&key, self.config.css_loader_cache_ttl, || {
                self.fetcher
                    .fetch(url, self.config.fetch_timeout)
                    .map(Arc::<str>::from)
            })?;
        Ok((lookup.value, lookup.error))
    }

    fn resolve(&self, href: &str) -> String {
        match self.base_url {
            Some(base) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

/// Only stylesheets for screen rendering are inlined.
fn applies_to_screen(media: Option<&str>) -> bool {
    let Some(media) = media else {
        return true;
    };
    let media = media.trim();
    media.is_empty()
        || media
            .split(',')
            .any(|m| matches!(m.trim().to_ascii_lowercase().as_str(), "screen" | "all"))
}

fn is_css_type(ty: Option<&str>) -> bool {
    ty.is_none_or(|t| {
        let t = t.trim();
        t.is_empty() || t.eq_ignore_ascii_case("text/css")
    })
}

fn is_stylesheet_link(rel: Option<&str>) -> bool {
    rel.is_some_and(|r| {
        r.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}
