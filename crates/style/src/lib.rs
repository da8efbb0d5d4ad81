//! # Style Engine
//!
//! Selector matching and cascade resolution over a parsed [`dom::Dom`].

pub mod cascade;
pub mod element;
pub mod matching;

pub use cascade::{
    MatchedRule, RuleOrigin, SourceOrder, StyleRule, build_rule_list, cascade,
    collect_matching_rules, resolve,
};
pub use element::ElementView;
pub use matching::{matches, matches_compound, matches_selector};
