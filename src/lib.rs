//! # inlinify
//!
//! Moves a document's CSS into `style` attributes, following the cascade:
//! importance, then specificity, then source order. Whatever cannot be
//! inlined (media queries, `:hover`, pseudo-elements, other at-rules) stays
//! behind in a `<style>` block.
//!
//! ```no_run
//! use inlinify::{InlineConfig, transform};
//!
//! let html = "<style>p { color: red }</style><p>hi</p>";
//! let out = transform(html, &InlineConfig::default()).unwrap();
//! assert!(out.contains("<p style=\"color: red;\">hi</p>"));
//! ```

pub mod cache;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod merger;
pub mod urls;

pub use cache::{CacheAdapter, CacheBackend, CacheEntry, MemoryCache, NullCache};
pub use collector::{FileFetcher, NoFetcher, StylesheetFetcher};
pub use config::{AttributeMapping, InlineConfig, OutputMethod};
pub use engine::{Inliner, TransformOutput, transform};
pub use error::{CacheError, Diagnostic, FetchError, InlineError, Result};
