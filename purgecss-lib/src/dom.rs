use html5ever::QualName;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A minimal DOM, just enough structure for html5ever's tree builder to
/// move nodes around while content tokens are collected.
pub mod dom_tree {
    use super::*;

    pub type Handle = Rc<RefCell<Node>>;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
    }

    #[derive(Debug, Clone, Default)]
    pub struct DocumentRootNode {
        pub children: Vec<Handle>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: Vec<(String, String)>,
        pub children: Vec<Handle>,
        pub parent: Option<Weak<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Handle,
    }

    impl Node {
        pub fn children_mut(&mut self) -> Option<&mut Vec<Handle>> {
            match self {
                Node::DocumentRoot(root) => Some(&mut root.children),
                Node::Element(elem) => Some(&mut elem.children),
                Node::Text(_) => None,
            }
        }
    }

    impl ElementNode {
        pub fn new(qual_name: QualName, attributes: Vec<(String, String)>) -> Self {
            ElementNode {
                tag: qual_name.local.to_string(),
                qual_name,
                attributes,
                children: Vec::new(),
                parent: None,
            }
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::default()))),
        }
    }

    /// Parent of an element node; text and the root have none.
    pub fn parent_of(node: &Handle) -> Option<Handle> {
        match &*node.borrow() {
            Node::Element(elem) => elem.parent.as_ref().and_then(Weak::upgrade),
            _ => None,
        }
    }

    pub fn set_parent(node: &Handle, parent: &Handle) {
        if let Node::Element(elem) = &mut *node.borrow_mut() {
            elem.parent = Some(Rc::downgrade(parent));
        }
    }

    /// Detach `node` from its parent's child list, if it has a parent.
    pub fn detach(node: &Handle) {
        if let Some(parent) = parent_of(node) {
            let mut parent = parent.borrow_mut();
            if let Some(children) = parent.children_mut() {
                children.retain(|child| !Rc::ptr_eq(child, node));
            }
        }
        if let Node::Element(elem) = &mut *node.borrow_mut() {
            elem.parent = None;
        }
    }
}
