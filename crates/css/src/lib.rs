//! CSS crate: tokenizer, stylesheet parser and selector parser.
//!
//! Declaration values are kept as raw source text: the inliner only needs to
//! move them around, never to interpret them.

pub mod parser;
pub mod selector;
pub mod token;

pub use parser::{
    CssDiagnostic, CssRule, Declaration, DeclarationBlock, Passthrough, Stylesheet,
    parse_declaration_block, parse_stylesheet,
};
pub use selector::{ComplexSelector, SelectorError, Specificity, parse_selector, parse_selector_list};
