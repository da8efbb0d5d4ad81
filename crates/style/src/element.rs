//! Read-only view of one element in a [`Dom`].

use std::cell::OnceCell;

use css::{Declaration, parse_declaration_block};
use dom::{Dom, ElementData, NodeData, NodeId};

/// Borrowed handle to an element node.
///
/// The `style` attribute is parsed the first time
/// [`inline_declarations`](ElementView::inline_declarations) is called and
/// kept for the lifetime of the view.
pub struct ElementView<'a> {
    dom: &'a Dom,
    id: NodeId,
    data: &'a ElementData,
    inline: OnceCell<Vec<Declaration>>,
}

impl<'a> ElementView<'a> {
    /// `None` when `id` is not an element.
    pub fn new(dom: &'a Dom, id: NodeId) -> Option<Self> {
        let data = dom.element(id)?;
        Some(Self {
            dom,
            id,
            data,
            inline: OnceCell::new(),
        })
    }

    pub fn dom(&self) -> &'a Dom {
        self.dom
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn data(&self) -> &'a ElementData {
        self.data
    }

    pub fn tag_name(&self) -> &'a str {
        self.data.tag_name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.data.attr(name)
    }

    pub fn id_attr(&self) -> Option<&'a str> {
        self.data.id.as_deref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.data.classes.iter().any(|c| c == class)
    }

    /// Declarations of the current `style` attribute. Malformed entries are
    /// dropped.
    pub fn inline_declarations(&self) -> &[Declaration] {
        self.inline.get_or_init(|| match self.data.attr("style") {
            Some(style) => parse_declaration_block(style).declarations,
            None => Vec::new(),
        })
    }

    pub fn parent_element(&self) -> Option<ElementView<'a>> {
        parent_element(self.dom, self.id).and_then(|p| ElementView::new(self.dom, p))
    }

    pub fn prev_sibling_element(&self) -> Option<ElementView<'a>> {
        prev_sibling_element(self.dom, self.id).and_then(|p| ElementView::new(self.dom, p))
    }

    pub fn next_sibling_element(&self) -> Option<ElementView<'a>> {
        next_sibling_element(self.dom, self.id).and_then(|p| ElementView::new(self.dom, p))
    }

    /// Whether the parent is the document node itself.
    pub fn is_root(&self) -> bool {
        self.dom
            .parent(self.id)
            .and_then(|p| self.dom.node(p))
            .is_some_and(|n| matches!(n.data, NodeData::Document { .. }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DOM traversal helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Get the parent of `node_id` if it is an element.
pub(crate) fn parent_element(dom: &Dom, node_id: NodeId) -> Option<NodeId> {
    let parent_id = dom.parent(node_id)?;
    dom.element(parent_id).map(|_| parent_id)
}

/// Get the immediately preceding sibling that is an element.
pub(crate) fn prev_sibling_element(dom: &Dom, node_id: NodeId) -> Option<NodeId> {
    let mut cursor = dom.node(node_id)?.prev_sibling;
    while let Some(sib_id) = cursor {
        let sib = dom.node(sib_id)?;
        if sib.is_element() {
            return Some(sib_id);
        }
        cursor = sib.prev_sibling;
    }
    None
}

/// Get the immediately following sibling that is an element.
pub(crate) fn next_sibling_element(dom: &Dom, node_id: NodeId) -> Option<NodeId> {
    let mut cursor = dom.node(node_id)?.next_sibling;
    while let Some(sib_id) = cursor {
        let sib = dom.node(sib_id)?;
        if sib.is_element() {
            return Some(sib_id);
        }
        cursor = sib.next_sibling;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::parse_html;

    #[test]
    fn inline_declarations_are_parsed_lazily() {
        let dom = parse_html("<p style=\"color: red; bad; margin: 0 !important\">x</p>");
        let p = dom.get_elements_by_tag(dom.document(), "p")[0];
        let view = ElementView::new(&dom, p).unwrap();
        let decls = view.inline_declarations();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0], Declaration::new("color", "red", false));
        assert!(decls[1].important);
        // Same slice on the second call.
        assert!(std::ptr::eq(decls, view.inline_declarations()));
    }

    #[test]
    fn sibling_navigation_skips_text() {
        let dom = parse_html("<ul><li id=a>1</li> text <li id=b>2</li></ul>");
        let b = dom.get_element_by_id(dom.document(), "b").unwrap();
        let view = ElementView::new(&dom, b).unwrap();
        let prev = view.prev_sibling_element().unwrap();
        assert_eq!(prev.id_attr(), Some("a"));
        assert_eq!(prev.next_sibling_element().unwrap().id_attr(), Some("b"));
        assert!(view.next_sibling_element().is_none());
        assert_eq!(view.parent_element().unwrap().tag_name(), "ul");
    }

    #[test]
    fn html_is_root() {
        let dom = parse_html("<p>x</p>");
        let html = dom.get_elements_by_tag(dom.document(), "html")[0];
        assert!(ElementView::new(&dom, html).unwrap().is_root());
        assert!(ElementView::new(&dom, dom.document()).is_none());
    }
}
