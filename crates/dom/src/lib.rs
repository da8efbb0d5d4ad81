//! DOM crate: Document Object Model
//!
//! Arena-based DOM tree built by html5ever/xml5ever and serialized back
//! through their serializers. Nodes are addressed by stable indices from
//! the `arena` crate instead of Rc/RefCell.

pub mod node;
pub mod parser;
pub mod serialize;
pub mod tree;

pub use node::*;
pub use parser::{parse_html, parse_xml};
pub use serialize::{SerializableNode, to_html, to_xml};
pub use tree::Dom;
