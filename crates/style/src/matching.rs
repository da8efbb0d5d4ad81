//! Selector matching: test whether a DOM element matches a CSS selector.
//!
//! Matching is done right-to-left: the subject compound is tested first and
//! then each combinator walks to the relative nodes that could satisfy the
//! next compound. Descendant and sibling combinators backtrack, so chains
//! like `a > b c` are answered correctly.

use css::selector::{
    AttrOp, AttributeSelector, Combinator, ComplexSelector, CompoundSelector, PseudoClass,
};
use css::Specificity;
use dom::{Dom, NodeData, NodeId};

use crate::element::{ElementView, next_sibling_element, parent_element, prev_sibling_element};

/// The selector's specificity when it matches `element`.
///
/// Unsupported selectors never match.
pub fn matches(selector: &ComplexSelector, element: &ElementView<'_>) -> Option<Specificity> {
    matches_selector(element.dom(), element.node_id(), selector).then(|| selector.specificity())
}

/// Check whether the element at `node_id` matches the given complex selector.
pub fn matches_selector(dom: &Dom, node_id: NodeId, selector: &ComplexSelector) -> bool {
    if selector.parts.is_empty() || !selector.is_supported() {
        return false;
    }
    matches_parts(dom, node_id, &selector.parts)
}

/// `parts[0]` must match `node_id`; its combinator relates it to `parts[1]`.
fn matches_parts(
    dom: &Dom,
    node_id: NodeId,
    parts: &[(CompoundSelector, Option<Combinator>)],
) -> bool {
    let Some(((compound, combinator), rest)) = parts.split_first() else {
        return true;
    };
    if !matches_compound(dom, node_id, compound) {
        return false;
    }
    let Some(combinator) = combinator else {
        return rest.is_empty();
    };

    match combinator {
        Combinator::Child => {
            parent_element(dom, node_id).is_some_and(|p| matches_parts(dom, p, rest))
        }
        Combinator::Descendant => {
            let mut cursor = parent_element(dom, node_id);
            while let Some(ancestor) = cursor {
                if matches_parts(dom, ancestor, rest) {
                    return true;
                }
                cursor = parent_element(dom, ancestor);
            }
            false
        }
        Combinator::NextSibling => {
            prev_sibling_element(dom, node_id).is_some_and(|s| matches_parts(dom, s, rest))
        }
        Combinator::SubsequentSibling => {
            let mut cursor = prev_sibling_element(dom, node_id);
            while let Some(sibling) = cursor {
                if matches_parts(dom, sibling, rest) {
                    return true;
                }
                cursor = prev_sibling_element(dom, sibling);
            }
            false
        }
    }
}

/// Check whether a single element matches a compound selector.
/// All simple selectors in the compound must match.
pub fn matches_compound(dom: &Dom, node_id: NodeId, compound: &CompoundSelector) -> bool {
    let Some(elem) = dom.element(node_id) else {
        return false;
    };
    if compound.pseudo_element.is_some() {
        return false;
    }
    if let Some(tag) = &compound.tag {
        if !elem.tag_name().eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if elem.id.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound
        .classes
        .iter()
        .all(|class| elem.classes.iter().any(|c| c == class))
    {
        return false;
    }
    if !compound
        .attributes
        .iter()
        .all(|a| matches_attribute(elem.attr(&a.name), a))
    {
        return false;
    }
    compound
        .pseudo_classes
        .iter()
        .all(|pc| matches_pseudo_class(dom, node_id, pc))
}

/// Match an attribute selector against the attribute's current value.
fn matches_attribute(actual: Option<&str>, selector: &AttributeSelector) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    let expected = match (&selector.op, &selector.value) {
        (AttrOp::Exists, _) | (_, None) => return true,
        (_, Some(v)) => v.as_str(),
    };

    let (actual, expected) = if selector.case_insensitive {
        (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
    } else {
        (actual.to_string(), expected.to_string())
    };

    match selector.op {
        AttrOp::Exists => true,
        AttrOp::Eq => actual == expected,
        AttrOp::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttrOp::DashMatch => {
            actual == expected
                || (actual.starts_with(&expected) && actual[expected.len()..].starts_with('-'))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

fn matches_pseudo_class(dom: &Dom, node_id: NodeId, pc: &PseudoClass) -> bool {
    match pc {
        PseudoClass::Root => ElementView::new(dom, node_id).is_some_and(|e| e.is_root()),
        PseudoClass::FirstChild => prev_sibling_element(dom, node_id).is_none(),
        PseudoClass::LastChild => next_sibling_element(dom, node_id).is_none(),
        PseudoClass::OnlyChild => {
            prev_sibling_element(dom, node_id).is_none()
                && next_sibling_element(dom, node_id).is_none()
        }
        PseudoClass::FirstOfType => count_before(dom, node_id, true) == 0,
        PseudoClass::LastOfType => count_after(dom, node_id, true) == 0,
        PseudoClass::OnlyOfType => {
            count_before(dom, node_id, true) == 0 && count_after(dom, node_id, true) == 0
        }
        PseudoClass::NthChild(nth) => nth.matches(count_before(dom, node_id, false) + 1),
        PseudoClass::NthLastChild(nth) => nth.matches(count_after(dom, node_id, false) + 1),
        PseudoClass::NthOfType(nth) => nth.matches(count_before(dom, node_id, true) + 1),
        PseudoClass::NthLastOfType(nth) => nth.matches(count_after(dom, node_id, true) + 1),
        PseudoClass::Empty => is_empty_element(dom, node_id),
        PseudoClass::Not(inner) => !matches_compound(dom, node_id, inner),
        PseudoClass::Unsupported(_) => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sibling counting
// ─────────────────────────────────────────────────────────────────────────────

/// Number of element siblings before `node_id`; with `same_type` only
/// those sharing its tag name.
fn count_before(dom: &Dom, node_id: NodeId, same_type: bool) -> i32 {
    count_siblings(dom, node_id, same_type, prev_sibling_element)
}

fn count_after(dom: &Dom, node_id: NodeId, same_type: bool) -> i32 {
    count_siblings(dom, node_id, same_type, next_sibling_element)
}

fn count_siblings(
    dom: &Dom,
    node_id: NodeId,
    same_type: bool,
    step: fn(&Dom, NodeId) -> Option<NodeId>,
) -> i32 {
    let tag = dom.element(node_id).map(|e| e.tag_name());
    let mut count = 0;
    let mut cursor = step(dom, node_id);
    while let Some(sibling) = cursor {
        if !same_type || dom.element(sibling).map(|e| e.tag_name()) == tag {
            count += 1;
        }
        cursor = step(dom, sibling);
    }
    count
}

/// `:empty`: no element children and no text; comments are allowed.
fn is_empty_element(dom: &Dom, node_id: NodeId) -> bool {
    dom.children(node_id).iter().all(|&c| {
        dom.node(c).is_none_or(|n| match &n.data {
            NodeData::Element(_) => false,
            NodeData::Text { data } => data.is_empty(),
            _ => true,
        })
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use css::parse_selector;
    use dom::parse_html;

    /// ```text
    /// body
    /// ├── div#main.container
    /// │   ├── h1
    /// │   ├── p.intro  (data-x="foo bar", lang="en-US")
    /// │   └── p
    /// │       └── span
    /// └── footer
    /// ```
    const PAGE: &str = "<body><div id=main class=container><h1>T</h1>\
        <p class=intro data-x=\"foo bar\" lang=en-US>a</p><p><span>b</span></p></div>\
        <footer></footer></body>";

    fn check(dom: &Dom, selector: &str, tag: &str, index: usize) -> bool {
        let sel = parse_selector(selector).unwrap();
        let id = dom.get_elements_by_tag(dom.document(), tag)[index];
        matches_selector(dom, id, &sel)
    }

    #[test]
    fn test_simple_selectors() {
        let dom = parse_html(PAGE);
        assert!(check(&dom, "div", "div", 0));
        assert!(check(&dom, "#main", "div", 0));
        assert!(check(&dom, ".container", "div", 0));
        assert!(check(&dom, "div#main.container", "div", 0));
        assert!(check(&dom, "*", "footer", 0));
        assert!(!check(&dom, "div.other", "div", 0));
        assert!(!check(&dom, "#other", "div", 0));
    }

    #[test]
    fn test_combinators() {
        let dom = parse_html(PAGE);
        assert!(check(&dom, "div p", "p", 0));
        assert!(check(&dom, "body > div > p", "p", 1));
        assert!(check(&dom, "h1 + p", "p", 0));
        assert!(!check(&dom, "h1 + p", "p", 1));
        assert!(check(&dom, "h1 ~ p", "p", 1));
        assert!(check(&dom, "div ~ footer", "footer", 0));
        assert!(!check(&dom, "p > span", "p", 0));
        assert!(!check(&dom, "footer p", "p", 0));
    }

    #[test]
    fn test_backtracking_over_ancestors() {
        // The nearest `div` ancestor of the span is `.inner`, whose parent is
        // not `section`; the outer div must be tried as well.
        let dom = parse_html(
            "<section><div class=outer><div class=inner><span>x</span></div></div></section>",
        );
        assert!(check(&dom, "section > div span", "span", 0));
        assert!(check(&dom, "section > .outer > .inner > span", "span", 0));
        assert!(!check(&dom, "section > .inner span", "span", 0));
    }

    #[test]
    fn test_attribute_selectors() {
        let dom = parse_html(PAGE);
        assert!(check(&dom, "[data-x]", "p", 0));
        assert!(check(&dom, "[data-x~=bar]", "p", 0));
        assert!(check(&dom, "[data-x^=foo]", "p", 0));
        assert!(check(&dom, "[data-x$=\"bar\"]", "p", 0));
        assert!(check(&dom, "[data-x*=\"o b\"]", "p", 0));
        assert!(check(&dom, "[lang|=en]", "p", 0));
        assert!(check(&dom, "[data-x=\"FOO BAR\" i]", "p", 0));
        assert!(!check(&dom, "[data-x=\"FOO BAR\"]", "p", 0));
        assert!(!check(&dom, "[data-x~=fo]", "p", 0));
        assert!(!check(&dom, "[data-x]", "p", 1));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let dom = parse_html(PAGE);
        assert!(check(&dom, "h1:first-child", "h1", 0));
        assert!(check(&dom, "p:last-child", "p", 1));
        assert!(!check(&dom, "p:last-child", "p", 0));
        assert!(check(&dom, "p:first-of-type", "p", 0));
        assert!(check(&dom, "p:last-of-type", "p", 1));
        assert!(check(&dom, "span:only-child", "span", 0));
        assert!(check(&dom, "h1:only-of-type", "h1", 0));
        assert!(check(&dom, "p:nth-child(2)", "p", 0));
        assert!(check(&dom, "p:nth-child(odd)", "p", 1));
        assert!(check(&dom, "p:nth-last-child(1)", "p", 1));
        assert!(check(&dom, "p:nth-of-type(2n)", "p", 1));
        assert!(check(&dom, "p:nth-last-of-type(2)", "p", 0));
        assert!(check(&dom, "footer:empty", "footer", 0));
        assert!(!check(&dom, "h1:empty", "h1", 0));
        assert!(check(&dom, "html:root", "html", 0));
        assert!(!check(&dom, "body:root", "body", 0));
        assert!(check(&dom, "p:not(.intro)", "p", 1));
        assert!(!check(&dom, "p:not(.intro)", "p", 0));
    }

    #[test]
    fn test_unsupported_never_matches() {
        let dom = parse_html(PAGE);
        assert!(!check(&dom, "p:hover", "p", 0));
        assert!(!check(&dom, "p::before", "p", 0));
        assert!(!check(&dom, "p:not(:hover)", "p", 0));
    }

    #[test]
    fn test_matches_reports_specificity() {
        let dom = parse_html(PAGE);
        let p = dom.get_elements_by_tag(dom.document(), "p")[0];
        let view = ElementView::new(&dom, p).unwrap();
        let sel = parse_selector("#main p.intro").unwrap();
        assert_eq!(matches(&sel, &view), Some(Specificity::new(0, 1, 1, 1)));
        let star = parse_selector("* > *").unwrap();
        assert_eq!(matches(&star, &view), Some(Specificity::default()));
        let miss = parse_selector("footer").unwrap();
        assert_eq!(matches(&miss, &view), None);
    }
}
