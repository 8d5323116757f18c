//! HTML content extraction.
//!
//! html5ever builds a small DOM through [`PurgeTreeSink`]; the tree is then
//! walked to record every tag, class, id and attribute the markup uses.

use crate::dom::dom_tree::{self, Handle, Node};
use crate::parser::token_set::ExtractedTokenSet;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    Attribute, LocalName, Namespace, QualName,
};
use log::trace;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Parses `html_content` into a DOM tree. Never fails; html5ever recovers
/// from any malformed input.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = PurgeTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content)
}

/// Parses `html_content` and returns the identifiers it uses.
pub fn extract_html_tokens(html_content: &str) -> ExtractedTokenSet {
    let document = create_dom_tree(html_content);
    let mut tokens = ExtractedTokenSet::new();
    collect_tokens(&document.root, &mut tokens);
    tokens
}

/// Text of the first `<style>` element in document order. Comments and
/// raw text such as `<script>` bodies never produce elements, so a `<style>`
/// written inside them is not found.
pub fn first_style_text(html_content: &str) -> Option<String> {
    let document = create_dom_tree(html_content);
    find_style_text(&document.root)
}

fn find_style_text(node: &Handle) -> Option<String> {
    match &*node.borrow() {
        Node::DocumentRoot(root) => root.children.iter().find_map(find_style_text),
        Node::Element(elem) if elem.tag == "style" => {
            let mut text = String::new();
            for child in &elem.children {
                if let Node::Text(chunk) = &*child.borrow() {
                    text.push_str(chunk);
                }
            }
            Some(text)
        }
        Node::Element(elem) => elem.children.iter().find_map(find_style_text),
        Node::Text(_) => None,
    }
}

/// Recursively walk the DOM tree and record element identifiers.
fn collect_tokens(node: &Handle, tokens: &mut ExtractedTokenSet) {
    match &*node.borrow() {
        Node::DocumentRoot(root) => {
            for child in &root.children {
                collect_tokens(child, tokens);
            }
        }
        Node::Element(elem) => {
            tokens.insert_tag(&elem.tag);
            for (name, value) in &elem.attributes {
                tokens.insert_attribute(name, value);
                match name.as_str() {
                    "class" => {
                        for class in value.split_whitespace() {
                            tokens.insert_class(class);
                        }
                    }
                    "id" => tokens.insert_id(value.trim()),
                    _ => {}
                }
            }
            for child in &elem.children {
                collect_tokens(child, tokens);
            }
        }
        Node::Text(_) => {}
    }
}

/// A TreeSink that builds [`dom_tree`] nodes.
///
/// Only presence matters for extraction, so nodes the tree builder moves
/// around without a known parent are parked under the document root.
pub struct PurgeTreeSink {
    document: dom_tree::Document,
}

impl PurgeTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
        }
    }

    fn into_handle(child: NodeOrText<Handle>) -> Handle {
        match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => Rc::new(RefCell::new(Node::Text(text.to_string()))),
        }
    }

    fn push_child(parent: &Handle, child: Handle) {
        dom_tree::set_parent(&child, parent);
        let mut parent = parent.borrow_mut();
        if let Some(children) = parent.children_mut() {
            children.push(child);
        }
    }
}

impl Default for PurgeTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct PurgeElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for PurgeElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for PurgeTreeSink {
    type Handle = Handle;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = PurgeElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        trace!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            Node::Element(elem) => PurgeElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            _ => PurgeElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        Rc::new(RefCell::new(Node::Element(dom_tree::ElementNode::new(
            name, attributes,
        ))))
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Text(String::new())))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Text(String::new())))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        Self::push_child(parent, Self::into_handle(child));
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if dom_tree::parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let child = Self::into_handle(child);
        let Some(parent) = dom_tree::parent_of(sibling) else {
            Self::push_child(&self.document.root, child);
            return;
        };
        dom_tree::set_parent(&child, &parent);
        let mut parent = parent.borrow_mut();
        if let Some(children) = parent.children_mut() {
            let pos = children
                .iter()
                .position(|c| Rc::ptr_eq(c, sibling))
                .unwrap_or(children.len());
            children.insert(pos, child);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        if let Node::Element(elem) = &mut *target.borrow_mut() {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if !elem.attributes.iter().any(|(k, _)| k == &key) {
                    elem.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        dom_tree::detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let moved = match node.borrow_mut().children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        };
        for child in moved {
            Self::push_child(new_parent, child);
        }
    }
}
