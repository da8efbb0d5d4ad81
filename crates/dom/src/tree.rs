//! DOM tree operations.
//!
//! The [`Dom`] struct owns an `Arena<Node>` and provides safe tree-manipulation
//! methods that keep the intrusive parent/child/sibling links consistent.

use arena::Arena;
use markup5ever::{LocalName, QualName, ns};

use crate::node::{Attr, ElementData, Node, NodeData, NodeId, QuirksMode};

// ---------------------------------------------------------------------------
// Dom
// ---------------------------------------------------------------------------

/// The complete DOM tree. The document node is created up front and is
/// always the first slot of the arena.
pub struct Dom {
    pub nodes: Arena<Node>,
    document: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let document = nodes.alloc(Node::new(NodeData::Document {
            quirks_mode: QuirksMode::NoQuirks,
        }));
        Self { nodes, document }
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id).and_then(Node::as_element_mut)
    }

    pub fn set_quirks_mode(&mut self, mode: QuirksMode) {
        if let Some(NodeData::Document { quirks_mode }) =
            self.nodes.get_mut(self.document).map(|n| &mut n.data)
        {
            *quirks_mode = mode;
        }
    }

    // =======================================================================
    // Node creation
    // =======================================================================

    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.nodes.alloc(Node::new(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }))
    }

    /// Create an Element node. The `id` and `classes` caches are extracted
    /// from `attrs` automatically.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attr>) -> NodeId {
        self.nodes
            .alloc(Node::new(NodeData::Element(ElementData::new(name, attrs))))
    }

    /// Convenience: create an element in the HTML namespace.
    pub fn create_html_element(&mut self, tag_name: &str, attrs: Vec<Attr>) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag_name));
        self.create_element(name, attrs)
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.nodes.alloc(Node::new(NodeData::Text {
            data: data.to_string(),
        }))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.nodes.alloc(Node::new(NodeData::Comment {
            data: data.to_string(),
        }))
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        self.nodes.alloc(Node::new(NodeData::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        }))
    }

    // =======================================================================
    // Tree mutation
    // =======================================================================

    /// Append `child` as the last child of `parent`.
    ///
    /// If `child` already has a parent it is first removed from its current
    /// position.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);

        let old_last = self.nodes.get(parent).and_then(|n| n.last_child);
        if let Some(last) = old_last.and_then(|id| self.nodes.get_mut(id)) {
            last.next_sibling = Some(child);
        }

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = old_last;
            node.next_sibling = None;
        }

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = Some(child);
            }
            parent_node.last_child = Some(child);
        }
    }

    /// Insert `child` immediately before `reference`, under the same parent.
    /// Does nothing if `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(child);

        let prev = self.nodes.get(reference).and_then(|n| n.prev_sibling);

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = Some(reference);
        }
        if let Some(ref_node) = self.nodes.get_mut(reference) {
            ref_node.prev_sibling = Some(child);
        }
        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.nodes.get_mut(prev_id) {
                    prev_node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.first_child = Some(child);
                }
            }
        }
    }

    /// Unlink a node from its parent. The node keeps its own subtree and can
    /// be re-inserted elsewhere.
    pub fn detach(&mut self, node_id: NodeId) {
        let (parent_id, prev, next) = match self.nodes.get(node_id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if let Some(prev_node) = prev.and_then(|id| self.nodes.get_mut(id)) {
            prev_node.next_sibling = next;
        }
        if let Some(next_node) = next.and_then(|id| self.nodes.get_mut(id)) {
            next_node.prev_sibling = prev;
        }
        if let Some(parent_node) = parent_id.and_then(|id| self.nodes.get_mut(id)) {
            if parent_node.first_child == Some(node_id) {
                parent_node.first_child = next;
            }
            if parent_node.last_child == Some(node_id) {
                parent_node.last_child = prev;
            }
        }

        if let Some(node) = self.nodes.get_mut(node_id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.children(from) {
            self.append_child(to, child);
        }
    }

    /// Append text under `parent`, merging into a trailing text node if one
    /// exists.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.nodes.get(parent).and_then(|n| n.last_child);
        if let Some(NodeData::Text { data }) = last
            .and_then(|id| self.nodes.get_mut(id))
            .map(|n| &mut n.data)
        {
            data.push_str(text);
            return;
        }
        let node = self.create_text(text);
        self.append_child(parent, node);
    }

    /// Insert text right before `sibling`, merging into a preceding text node
    /// if one exists.
    pub fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
        let prev = self.nodes.get(sibling).and_then(|n| n.prev_sibling);
        if let Some(NodeData::Text { data }) = prev
            .and_then(|id| self.nodes.get_mut(id))
            .map(|n| &mut n.data)
        {
            data.push_str(text);
            return;
        }
        let node = self.create_text(text);
        self.insert_before(sibling, node);
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        for child in self.children(id) {
            self.detach(child);
        }
        let node = self.create_text(text);
        self.append_child(id, node);
    }

    // =======================================================================
    // Traversal
    // =======================================================================

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Return the immediate children of `parent` in document order.
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.nodes.get(parent).and_then(|n| n.first_child);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.nodes.get(id).and_then(|n| n.next_sibling);
        }
        out
    }

    /// Return the chain of ancestors from `node` up to (and including) the root.
    /// The first element is the direct parent, the last is the root.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.parent(id);
        }
        out
    }

    /// Return all descendants of `node` in pre-order DFS (not including `node` itself).
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// Every element in the document, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .filter(|&id| self.element(id).is_some())
            .collect()
    }

    /// Concatenated data of the direct text children of `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.children(id)
            .into_iter()
            .filter_map(|c| match self.nodes.get(c).map(|n| &n.data) {
                Some(NodeData::Text { data }) => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }

    // =======================================================================
    // Queries
    // =======================================================================

    /// Find the first element with the given `id` attribute in the subtree
    /// rooted at `root` (pre-order DFS).
    pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|&n| self.element(n).is_some_and(|e| e.id.as_deref() == Some(id)))
    }

    /// Return all elements whose local name matches `tag` in the subtree
    /// rooted at `root` (pre-order DFS).
    pub fn get_elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|&n| self.element(n).is_some_and(|e| e.tag_name() == tag))
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
