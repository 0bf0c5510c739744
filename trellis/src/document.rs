//! Arena-backed markup tree with a shared attach stack.
//!
//! A [`Document`] owns every node of one tree and the stack of open scopes.
//! New content always lands on the node at the top of that stack (the
//! "attach point"), whichever [`Tag`] handle the request came through, so
//!
//! ```rust
//! use trellis::Document;
//!
//! let h = Document::html();
//! let table = h.tag("table");
//! let _scope = table.enter();
//! h.tag("tr");
//! ```
//!
//! nests the `tr` inside the `table` without any explicit parent chaining.
//!
//! Scopes must be closed in the reverse order they were opened. A scope that
//! is never closed leaves every later creation on this document attached to
//! the wrong node; [`Scope`](crate::Scope) guards close on drop to keep that
//! from happening by accident.

use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::cell::RefCell;
use std::fmt;

use crate::builder::Tag;
use crate::escape::escape_text;
use crate::{Error, Flavor};

/// Payload of one arena node.
#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(ElementData),
    /// Text segment, stored escaped unless it was inserted raw.
    Text(String),
}

/// An element, or the nameless root container.
#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    /// `None` only for the root.
    pub tag: Option<String>,

    /// Attribute values are stored escaped; `None` is a valueless attribute.
    /// IndexMap keeps declaration order for serialization.
    pub attrs: IndexMap<String, Option<String>>,

    /// Break lines between children and around the tags.
    pub newlines: bool,
}

impl NodeData {
    pub(crate) fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(elem) => Some(elem),
            NodeData::Text(_) => None,
        }
    }
}

/// A markup tree under construction.
#[derive(Debug, Clone)]
pub struct Document {
    flavor: Flavor,

    /// Every node of the tree, including detached ones awaiting `append`.
    pub(crate) arena: RefCell<Arena<NodeData>>,

    /// The nameless container holding top-level siblings.
    pub(crate) root: NodeId,

    /// Open scopes; the root is always at the bottom.
    stack: RefCell<Vec<NodeId>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Flavor::default())
    }
}

impl Document {
    /// Create an empty document of the given flavor.
    pub fn new(flavor: Flavor) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::Element(ElementData {
            tag: None,
            attrs: IndexMap::new(),
            newlines: true,
        }));

        Document {
            flavor,
            arena: RefCell::new(arena),
            root,
            stack: RefCell::new(vec![root]),
        }
    }

    /// Empty HTML document.
    pub fn html() -> Self {
        Self::new(Flavor::Html)
    }

    /// Empty XHTML document.
    pub fn xhtml() -> Self {
        Self::new(Flavor::Xhtml)
    }

    /// Empty XML document.
    pub fn xml() -> Self {
        Self::new(Flavor::Xml)
    }

    /// Set whether top-level siblings are separated by line breaks (on by default).
    pub fn with_newlines(self, newlines: bool) -> Self {
        self.update_element(self.root, |elem| elem.newlines = newlines);
        self
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Number of scopes currently open.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len() - 1
    }

    /// Create a `<name>` element at the attach point and return its handle.
    ///
    /// The element goes to the innermost open scope, or the top level when
    /// no scope is open.
    pub fn tag(&self, name: &str) -> Tag<'_> {
        let id = self.new_element(name);
        self.attach(id);
        Tag::new(self, id)
    }

    /// Create a `<name>` element that is not attached anywhere yet.
    ///
    /// Use [`Document::append`] to place it later.
    pub fn element(&self, name: &str) -> Tag<'_> {
        Tag::new(self, self.new_element(name))
    }

    /// Append `text` at the attach point, escaped.
    pub fn text(&self, text: &str) {
        self.text_with(text, true);
    }

    /// Append `markup` at the attach point without escaping it.
    pub fn raw_text(&self, markup: &str) {
        self.text_with(markup, false);
    }

    /// Append a text segment at the attach point, escaping it if asked to.
    pub fn text_with(&self, text: &str, escape: bool) {
        let text = if escape {
            escape_text(text).into_owned()
        } else {
            text.to_owned()
        };
        self.push_text(self.attach_point(), text);
    }

    /// Append a line break at the attach point.
    pub fn newline(&self) {
        self.push_text(self.attach_point(), "\n".to_owned());
    }

    /// Append an existing element at the attach point.
    ///
    /// Elements of this document move from wherever they were; elements of
    /// another document are copied in with their whole subtree.
    pub fn append(&self, node: Tag<'_>) -> Result<(), Error> {
        let parent = self.attach_point();

        if !std::ptr::eq(node.document(), self) {
            let source = node.document().arena.borrow();
            let mut arena = self.arena.borrow_mut();
            let copy = copy_subtree(&source, node.id(), &mut arena);
            parent.append(copy, &mut arena);
            return Ok(());
        }

        let mut arena = self.arena.borrow_mut();
        if parent.ancestors(&arena).any(|ancestor| ancestor == node.id()) {
            return Err(Error::AppendAncestor);
        }
        node.id().detach(&mut arena);
        parent.append(node.id(), &mut arena);
        Ok(())
    }

    /// Append a string at the attach point as is, without escaping.
    pub fn append_str(&self, markup: &str) {
        self.raw_text(markup);
    }

    /// Copy the top-level content of `other` to the attach point.
    pub fn append_document(&self, other: &Document) {
        let parent = self.attach_point();
        let source = other.arena.borrow();
        let mut arena = self.arena.borrow_mut();
        for child in other.root.children(&source) {
            let copy = copy_subtree(&source, child, &mut arena);
            parent.append(copy, &mut arena);
        }
    }

    /// Render with the serializer of this document's flavor.
    pub fn render(&self) -> String {
        self.flavor.serializer().serialize(self)
    }

    pub(crate) fn attach_point(&self) -> NodeId {
        let stack = self.stack.borrow();
        stack.last().copied().unwrap_or(self.root)
    }

    pub(crate) fn push_scope(&self, id: NodeId) {
        trace!(?id, depth = self.depth() + 1, "enter scope");
        self.stack.borrow_mut().push(id);
    }

    pub(crate) fn pop_scope(&self, id: NodeId) {
        let mut stack = self.stack.borrow_mut();
        if stack.len() <= 1 {
            debug_assert!(
                std::thread::panicking(),
                "scope exited on {id:?} with no scope open"
            );
            return;
        }
        let popped = stack.pop();
        trace!(?popped, depth = stack.len() - 1, "exit scope");
        if !std::thread::panicking() {
            debug_assert_eq!(
                popped,
                Some(id),
                "scopes must be exited in reverse order of entry"
            );
        }
    }

    /// Drop open scopes until only `depth` of them remain.
    pub(crate) fn truncate_scopes(&self, depth: usize) {
        self.stack.borrow_mut().truncate(depth + 1);
    }

    /// Open scopes, innermost last, excluding the root.
    pub(crate) fn open_scopes(&self) -> Vec<NodeId> {
        self.stack.borrow()[1..].to_vec()
    }

    pub(crate) fn new_element(&self, name: &str) -> NodeId {
        let newlines = self.flavor.newlines_for(name);
        trace!(tag = name, newlines, "create element");
        self.arena
            .borrow_mut()
            .new_node(NodeData::Element(ElementData {
                tag: Some(name.to_owned()),
                attrs: IndexMap::new(),
                newlines,
            }))
    }

    pub(crate) fn attach(&self, id: NodeId) {
        let parent = self.attach_point();
        parent.append(id, &mut self.arena.borrow_mut());
    }

    pub(crate) fn push_text(&self, parent: NodeId, text: String) {
        let mut arena = self.arena.borrow_mut();
        let node = arena.new_node(NodeData::Text(text));
        parent.append(node, &mut arena);
    }

    /// Run `f` on the element data of `id`; text nodes are left alone.
    pub(crate) fn update_element(&self, id: NodeId, f: impl FnOnce(&mut ElementData)) {
        if let NodeData::Element(elem) = self.arena.borrow_mut()[id].get_mut() {
            f(elem);
        }
    }

    /// Remove every child of `id`.
    pub(crate) fn clear_children(&self, id: NodeId) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<_> = id.children(&arena).collect();
        for child in children {
            child.remove_subtree(&mut arena);
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.flavor.serializer().write_document(self, f)
    }
}

fn copy_subtree(source: &Arena<NodeData>, id: NodeId, arena: &mut Arena<NodeData>) -> NodeId {
    let copy = arena.new_node(source[id].get().clone());
    for child in id.children(source) {
        let child_copy = copy_subtree(source, child, arena);
        copy.append(child_copy, arena);
    }
    copy
}
