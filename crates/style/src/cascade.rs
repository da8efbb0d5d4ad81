//! Cascade resolution: collect matching rules, rank their declarations and
//! pick one winner per property.
//!
//! Ranking, low → high priority:
//!   1. importance (`!important` beats everything without it)
//!   2. specificity, with the `style` attribute counting as `(1,0,0,0)`
//!   3. source order, with the `style` attribute after every rule
//!   4. position of the declaration inside its block

use std::collections::HashMap;
use std::sync::Arc;

use css::{ComplexSelector, Declaration, Specificity, Stylesheet};

use crate::element::ElementView;
use crate::matching::matches;

// ─────────────────────────────────────────────────────────────────────────────
// StyleRule
// ─────────────────────────────────────────────────────────────────────────────

/// Where a rule was written: which stylesheet of the document, and which
/// selector of that sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleOrigin {
    pub stylesheet_id: usize,
    pub position: usize,
}

/// One selector of a parsed stylesheet, placed in document-wide cascade order.
///
/// The parsed sheet is shared; a `StyleRule` only records which of its rules
/// it stands for.
#[derive(Debug, Clone)]
pub struct StyleRule {
    sheet: Arc<Stylesheet>,
    index: usize,
    /// Strictly increasing across all sheets of one document.
    pub source_index: usize,
    pub origin: RuleOrigin,
}

impl StyleRule {
    pub fn selector(&self) -> &ComplexSelector {
        &self.sheet.rules[self.index].selector
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.sheet.rules[self.index].declarations
    }
}

/// Flatten the document's stylesheets, in document order, into one rule
/// list.
///
/// Unsupported selectors are left out since they can never match. Rules
/// using `*` are left out unless `include_universal` is set.
pub fn build_rule_list(sheets: &[Arc<Stylesheet>], include_universal: bool) -> Vec<StyleRule> {
    let mut rules = Vec::new();
    let mut source_index = 0usize;
    for (stylesheet_id, sheet) in sheets.iter().enumerate() {
        for (index, rule) in sheet.rules.iter().enumerate() {
            if !rule.selector.is_supported() {
                continue;
            }
            if !include_universal && rule.selector.has_universal() {
                tracing::trace!(selector = %rule.selector.text, "skipping universal selector");
                continue;
            }
            rules.push(StyleRule {
                sheet: Arc::clone(sheet),
                index,
                source_index,
                origin: RuleOrigin {
                    stylesheet_id,
                    position: rule.position,
                },
            });
            source_index += 1;
        }
    }
    rules
}

// ─────────────────────────────────────────────────────────────────────────────
// MatchedRule
// ─────────────────────────────────────────────────────────────────────────────

/// A rule that matched a particular element, annotated with cascade metadata.
#[derive(Debug, Clone, Copy)]
pub struct MatchedRule<'r> {
    pub rule: &'r StyleRule,
    pub specificity: Specificity,
}

/// Collect all rules that match `element`, in rule-list order.
pub fn collect_matching_rules<'r>(
    element: &ElementView<'_>,
    rules: &'r [StyleRule],
) -> Vec<MatchedRule<'r>> {
    rules
        .iter()
        .filter_map(|rule| {
            matches(rule.selector(), element).map(|specificity| MatchedRule { rule, specificity })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolve
// ─────────────────────────────────────────────────────────────────────────────

/// Source order of a declaration. Declarations from the `style` attribute
/// sort after every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceOrder {
    Rule(usize),
    Inline,
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'d> {
    declaration: &'d Declaration,
    specificity: Specificity,
    order: SourceOrder,
    position: usize,
}

impl Candidate<'_> {
    fn rank(&self) -> (bool, Specificity, SourceOrder, usize) {
        (
            self.declaration.important,
            self.specificity,
            self.order,
            self.position,
        )
    }
}

/// The effective declarations for `element`: one per property, in the order
/// each property is first seen among matched rules (ascending source order)
/// followed by the element's own `style` attribute.
pub fn resolve(element: &ElementView<'_>, rules: &[StyleRule]) -> Vec<Declaration> {
    let matched = collect_matching_rules(element, rules);
    cascade(&matched, element.inline_declarations())
}

/// Pick the winning declaration per property from matched rules plus the
/// element's inline declarations.
pub fn cascade(matched: &[MatchedRule<'_>], inline: &[Declaration]) -> Vec<Declaration> {
    let from_rules = matched.iter().flat_map(|m| {
        m.rule
            .declarations()
            .iter()
            .enumerate()
            .map(move |(position, declaration)| Candidate {
                declaration,
                specificity: m.specificity,
                order: SourceOrder::Rule(m.rule.source_index),
                position,
            })
    });
    let from_inline = inline
        .iter()
        .enumerate()
        .map(|(position, declaration)| Candidate {
            declaration,
            specificity: Specificity::INLINE,
            order: SourceOrder::Inline,
            position,
        });

    let mut winners: Vec<Candidate<'_>> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for candidate in from_rules.chain(from_inline) {
        match slots.get(candidate.declaration.property.as_str()) {
            Some(&slot) => {
                if candidate.rank() > winners[slot].rank() {
                    winners[slot] = candidate;
                }
            }
            None => {
                slots.insert(candidate.declaration.property.as_str(), winners.len());
                winners.push(candidate);
            }
        }
    }

    winners.into_iter().map(|c| c.declaration.clone()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
