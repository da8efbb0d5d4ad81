//! Tree construction.
//!
//! html5ever (and xml5ever for XHTML) drive a [`TreeSink`] that writes
//! straight into the arena-backed [`Dom`].

use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{ParseOpts, parse_document};
use markup5ever::QualName;
use markup5ever::interface::{ElementFlags, NodeOrText, QuirksMode, TreeSink};

use crate::node::{Attr, NodeId};
use crate::tree::Dom;

/// Parse an HTML document. html5ever recovers from every syntax error, so
/// this never fails.
pub fn parse_html(html: &str) -> Dom {
    parse_document(DomSink::new(), ParseOpts::default()).one(html)
}

/// Parse an XHTML document with the XML tree builder.
pub fn parse_xml(xml: &str) -> Dom {
    xml5ever::driver::parse_document(DomSink::new(), Default::default()).one(xml)
}

struct DomSink {
    dom: RefCell<Dom>,
    errors: RefCell<Vec<Cow<'static, str>>>,
}

impl DomSink {
    fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            errors: RefCell::new(Vec::new()),
        }
    }

    fn dom(&self) -> RefMut<'_, Dom> {
        self.dom.borrow_mut()
    }
}

fn convert_attrs(attrs: Vec<markup5ever::Attribute>) -> Vec<Attr> {
    attrs
        .into_iter()
        .map(|a| Attr {
            name: a.name,
            value: a.value.to_string(),
        })
        .collect()
}

impl TreeSink for DomSink {
    type Output = Dom;

    type Handle = NodeId;

    type ElemName<'a>
        = Ref<'a, QualName>
    where
        Self: 'a;

    fn finish(self) -> Dom {
        let errors = self.errors.into_inner();
        if !errors.is_empty() {
            tracing::trace!(count = errors.len(), "html parse errors recovered");
        }
        self.dom.into_inner()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.errors.borrow_mut().push(msg);
    }

    fn get_document(&self) -> NodeId {
        self.dom.borrow().document()
    }

    fn elem_name<'a>(&'a self, target: &'a NodeId) -> Ref<'a, QualName> {
        Ref::map(self.dom.borrow(), |dom| {
            &dom.element(*target)
                .expect("TreeSink::elem_name called on non-element node")
                .name
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<markup5ever::Attribute>,
        _flags: ElementFlags,
    ) -> NodeId {
        self.dom().create_element(name, convert_attrs(attrs))
    }

    fn create_comment(&self, text: StrTendril) -> NodeId {
        self.dom().create_comment(&text)
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> NodeId {
        self.dom().create_processing_instruction(&target, &data)
    }

    fn append(&self, parent: &NodeId, child: NodeOrText<NodeId>) {
        match child {
            NodeOrText::AppendNode(id) => self.dom().append_child(*parent, id),
            NodeOrText::AppendText(text) => self.dom().append_text(*parent, &text),
        }
    }

    fn append_before_sibling(&self, sibling: &NodeId, new_node: NodeOrText<NodeId>) {
        match new_node {
            NodeOrText::AppendNode(id) => self.dom().insert_before(*sibling, id),
            NodeOrText::AppendText(text) => self.dom().insert_text_before(*sibling, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &NodeId,
        prev_element: &NodeId,
        child: NodeOrText<NodeId>,
    ) {
        let has_parent = self.dom.borrow().parent(*element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let mut dom = self.dom();
        let doctype = dom.create_doctype(&name, &public_id, &system_id);
        let document = dom.document();
        dom.append_child(document, doctype);
    }

    // Template contents are kept as ordinary children so they serialize back
    // in place.
    fn get_template_contents(&self, target: &NodeId) -> NodeId {
        *target
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.dom().set_quirks_mode(mode);
    }

    fn add_attrs_if_missing(&self, target: &NodeId, attrs: Vec<markup5ever::Attribute>) {
        let mut dom = self.dom();
        let Some(element) = dom.element_mut(*target) else {
            return;
        };
        for Attr { name, value } in convert_attrs(attrs) {
            if !element.has_attr(&name.local) {
                element.set_attr(&name.local, value);
            }
        }
    }

    fn remove_from_parent(&self, target: &NodeId) {
        self.dom().detach(*target);
    }

    fn reparent_children(&self, node: &NodeId, new_parent: &NodeId) {
        self.dom().reparent_children(*node, *new_parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;

    #[test]
    fn builds_implied_structure() {
        let dom = parse_html("<p class=x>hi");
        let tags: Vec<String> = dom
            .elements()
            .into_iter()
            .map(|id| dom.element(id).unwrap().tag_name().to_string())
            .collect();
        assert_eq!(tags, vec!["html", "head", "body", "p"]);
        let p = dom.get_elements_by_tag(dom.document(), "p")[0];
        assert_eq!(dom.element(p).unwrap().classes, vec!["x"]);
        assert_eq!(dom.text_content(p), "hi");
    }

    #[test]
    fn keeps_doctype_when_present() {
        let dom = parse_html("<!DOCTYPE html><title>t</title>");
        let first = dom.children(dom.document())[0];
        assert!(matches!(
            &dom.node(first).unwrap().data,
            NodeData::Doctype { name, .. } if name == "html"
        ));

        let bare = parse_html("<title>t</title>");
        let first = bare.children(bare.document())[0];
        assert!(bare.node(first).unwrap().is_element());
    }

    #[test]
    fn style_text_is_raw() {
        let dom = parse_html("<style>p > a { color: red }</style>");
        let style = dom.get_elements_by_tag(dom.document(), "style")[0];
        assert_eq!(dom.text_content(style), "p > a { color: red }");
    }

    #[test]
    fn misnested_markup_is_recovered() {
        let dom = parse_html("<p><b>one<i>two</b>three</i></p>");
        let p = dom.get_elements_by_tag(dom.document(), "p")[0];
        assert!(!dom.get_elements_by_tag(p, "b").is_empty());
        assert!(dom.get_elements_by_tag(p, "i").len() >= 1);
    }

    #[test]
    fn parses_xhtml() {
        let dom = parse_xml(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\"><body><p id=\"a\">x</p></body></html>",
        );
        let p = dom.get_element_by_id(dom.document(), "a").unwrap();
        assert_eq!(dom.element(p).unwrap().tag_name(), "p");
    }

    #[test]
    fn repeated_body_merges_new_attributes() {
        let dom = parse_html("<body id=a><p>x</p><body id=b class=wide>");
        let body = dom.get_elements_by_tag(dom.document(), "body")[0];
        let body = dom.element(body).unwrap();
        assert_eq!(body.attr("id"), Some("a"));
        assert_eq!(body.classes, vec!["wide"]);
    }
}
