//! Serialization back to markup, through html5ever's and xml5ever's
//! serializers.

use std::collections::VecDeque;
use std::io;

use markup5ever::QualName;
use markup5ever::serialize::{Serialize, Serializer, TraversalScope};

use crate::node::{NodeData, NodeId};
use crate::tree::Dom;

/// A node plus the tree it lives in, in the shape the serializers expect.
pub struct SerializableNode<'a> {
    dom: &'a Dom,
    id: NodeId,
}

impl<'a> SerializableNode<'a> {
    pub fn new(dom: &'a Dom, id: NodeId) -> Self {
        Self { dom, id }
    }
}

enum Op {
    Open(NodeId),
    Close(QualName),
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut ops = VecDeque::new();
        match traversal_scope {
            TraversalScope::IncludeNode => ops.push_back(Op::Open(self.id)),
            TraversalScope::ChildrenOnly(_) => {
                ops.extend(self.dom.children(self.id).into_iter().map(Op::Open))
            }
        }

        while let Some(op) = ops.pop_front() {
            let id = match op {
                Op::Open(id) => id,
                Op::Close(name) => {
                    serializer.end_elem(name)?;
                    continue;
                }
            };
            let Some(node) = self.dom.node(id) else {
                continue;
            };
            match &node.data {
                NodeData::Element(element) => {
                    serializer.start_elem(
                        element.name.clone(),
                        element.attrs.iter().map(|a| (&a.name, a.value.as_str())),
                    )?;
                    ops.push_front(Op::Close(element.name.clone()));
                    for child in self.dom.children(id).into_iter().rev() {
                        ops.push_front(Op::Open(child));
                    }
                }
                NodeData::Doctype { name, .. } => serializer.write_doctype(name)?,
                NodeData::Text { data } => serializer.write_text(data)?,
                NodeData::Comment { data } => serializer.write_comment(data)?,
                NodeData::ProcessingInstruction { target, data } => {
                    serializer.write_processing_instruction(target, data)?
                }
                NodeData::Document { .. } => {
                    ops.extend(self.dom.children(id).into_iter().map(Op::Open))
                }
            }
        }
        Ok(())
    }
}

/// Serialize the whole document as HTML.
pub fn to_html(dom: &Dom) -> io::Result<String> {
    let mut out = Vec::new();
    let node = SerializableNode::new(dom, dom.document());
    html5ever::serialize::serialize(
        &mut out,
        &node,
        html5ever::serialize::SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )?;
    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Serialize the whole document as XML.
pub fn to_xml(dom: &Dom) -> io::Result<String> {
    let mut out = Vec::new();
    let node = SerializableNode::new(dom, dom.document());
    xml5ever::serialize::serialize(
        &mut out,
        &node,
        xml5ever::serialize::SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
        },
    )?;
    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_html, parse_xml};

    #[test]
    fn html_round_trip_keeps_markup() {
        let src = "<!DOCTYPE html><html><head><style>p > a { color: red }</style></head>\
                   <body><p class=\"x\">a &amp; b<br></p><!-- note --></body></html>";
        let out = to_html(&parse_html(src)).unwrap();
        assert_eq!(
            out,
            "<!DOCTYPE html><html><head><style>p > a { color: red }</style></head>\
             <body><p class=\"x\">a &amp; b<br></p><!-- note --></body></html>"
        );
    }

    #[test]
    fn reflects_attribute_edits() {
        let mut dom = parse_html("<p>hi</p>");
        let p = dom.get_elements_by_tag(dom.document(), "p")[0];
        dom.element_mut(p).unwrap().set_attr("style", "color: red;");
        let out = to_html(&dom).unwrap();
        assert!(out.contains("<p style=\"color: red;\">hi</p>"));
    }

    #[test]
    fn xml_output_self_describes_elements() {
        let dom = parse_xml("<html xmlns=\"http://www.w3.org/1999/xhtml\"><body><p>x</p></body></html>");
        let out = to_xml(&dom).unwrap();
        assert!(out.contains("<p>x</p>"));
    }
}
