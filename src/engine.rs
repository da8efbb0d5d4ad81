//! The transform pipeline.
//!
//! parse → collect stylesheets → parse (cached) → resolve every element →
//! commit → serialize. All stylesheets are parsed before the first element
//! is resolved, and nothing is written to the document until every element
//! has been resolved.

use std::sync::Arc;

use css::{Declaration, Stylesheet, parse_stylesheet};
use dom::{Dom, NodeId};
use rayon::prelude::*;
use url::Url;

use crate::cache::{CacheAdapter, CacheBackend, content_key};
use crate::collector::{CssSource, FileFetcher, StylesheetCollector, StylesheetFetcher};
use crate::config::{InlineConfig, OutputMethod};
use crate::error::{Diagnostic, Result};
use crate::merger::{apply_declarations, remove_classes, rewrite_stylesheets};
use crate::urls::{parse_base_url, rewrite_urls};
use style::{ElementView, StyleRule, build_rule_list, collect_matching_rules, cascade};

/// The transformed document plus everything that was recovered from.
#[derive(Debug)]
pub struct TransformOutput {
    pub html: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Inlines CSS into documents. Cheap to share; one `Inliner` can transform
/// many documents concurrently.
pub struct Inliner {
    config: InlineConfig,
    base_url: Option<Url>,
    cache: CacheAdapter,
    fetcher: Arc<dyn StylesheetFetcher>,
}

impl Inliner {
    /// Build an inliner reading linked stylesheets from disk through a
    /// [`FileFetcher`] rooted at `config.base_path`.
    pub fn new(config: InlineConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().map(parse_base_url).transpose()?;
        let mut fetcher = FileFetcher::new();
        if let Some(root) = &config.base_path {
            fetcher = fetcher.with_root(root);
        }
        Ok(Self {
            cache: CacheAdapter::from_name(&config.cache_backend),
            fetcher: Arc::new(fetcher),
            base_url,
            config,
        })
    }

    pub fn with_fetcher(mut self, fetcher: impl StylesheetFetcher + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_cache(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache = CacheAdapter::new(backend);
        self
    }

    pub fn config(&self) -> &InlineConfig {
        &self.config
    }

    pub fn transform(&self, html: &str) -> Result<String> {
        Ok(self.transform_with_report(html)?.html)
    }

    pub fn transform_with_report(&self, html: &str) -> Result<TransformOutput> {
        let mut dom = match self.config.method {
            OutputMethod::Html => dom::parse_html(html.trim()),
            OutputMethod::Xml => dom::parse_xml(html.trim()),
        };

        let collection =
            StylesheetCollector::new(&self.config, self.base_url.as_ref(), &*self.fetcher, &self.cache)
                .collect(&dom);
        let mut diagnostics = collection.diagnostics;

        let sheets: Vec<(CssSource, Arc<Stylesheet>)> = collection
            .sources
            .into_iter()
            .map(|source| {
                let sheet = self.parse_cached(&source.text, &mut diagnostics);
                (source, sheet)
            })
            .collect();
        let rules = build_rule_list(
            &sheets.iter().map(|(_, s)| Arc::clone(s)).collect::<Vec<_>>(),
            self.config.include_star_selectors,
        );

        let resolved = self.resolve_all(&dom, &rules);
        tracing::debug!(
            rules = rules.len(),
            elements = resolved.len(),
            "resolved styles"
        );
        for (id, declarations) in &resolved {
            if let Some(element) = dom.element_mut(*id) {
                apply_declarations(element, declarations, &self.config);
            }
        }

        rewrite_stylesheets(&mut dom, &sheets, &self.config);
        if self.config.remove_classes {
            remove_classes(&mut dom);
        }
        if let Some(base) = &self.base_url {
            rewrite_urls(&mut dom, base, &self.config);
        }

        let html = match self.config.method {
            OutputMethod::Html => dom::to_html(&dom)?,
            OutputMethod::Xml => dom::to_xml(&dom)?,
        };
        if !diagnostics.is_empty() {
            tracing::info!(count = diagnostics.len(), "transform finished with diagnostics");
        }
        Ok(TransformOutput { html, diagnostics })
    }

    fn parse_cached(&self, text: &str, diagnostics: &mut Vec<Diagnostic>) -> Arc<Stylesheet> {
        let key = content_key(&self.config.css_parser_cache_key_prefix, text);
        let lookup = self
            .cache
            .get_or_compute(&key, self.config.css_parser_cache_ttl, || {
                Arc::new(parse_stylesheet(text))
            });
        if let Some(err) = lookup.error {
            diagnostics.push(err.into());
        }
        diagnostics.extend(lookup.value.diagnostics.iter().cloned().map(Diagnostic::from));
        lookup.value
    }

    /// Effective declarations of every element matched by at least one
    /// rule, in document order.
    fn resolve_all(&self, dom: &Dom, rules: &[StyleRule]) -> Vec<(NodeId, Vec<Declaration>)> {
        let elements = dom.elements();
        if self.config.parallel {
            elements
                .par_iter()
                .filter_map(|&id| resolve_element(dom, id, rules))
                .collect()
        } else {
            elements
                .iter()
                .filter_map(|&id| resolve_element(dom, id, rules))
                .collect()
        }
    }
}

fn resolve_element(
    dom: &Dom,
    id: NodeId,
    rules: &[StyleRule],
) -> Option<(NodeId, Vec<Declaration>)> {
    let element = ElementView::new(dom, id)?;
    let matched = collect_matching_rules(&element, rules);
    if matched.is_empty() {
        return None;
    }
    Some((id, cascade(&matched, element.inline_declarations())))
}

/// Inline `html`'s CSS with a one-off [`Inliner`].
pub fn transform(html: &str, config: &InlineConfig) -> Result<String> {
    Inliner::new(config.clone())?.transform(html)
}
