//! Turn a built (or parsed) tree back into builder calls.
//!
//! The output is Rust source that rebuilds the document with the
//! [`Document`] API, one statement per line:
//!
//! ```text
//! let h = Document::html();
//! h.tag("table").with(|_| {
//!     h.tag("tr").with(|_| {
//!         h.tag("td").content("cell 1");
//!     });
//! });
//! ```
//!
//! Whitespace-only text is dropped, so the result renders like the source
//! tree as long as that tree did not rely on whitespace segments.

use indextree::{Arena, NodeId};

use crate::document::{Document, ElementData, NodeData};
use crate::escape::{is_canonical_text, unescape};
use crate::Flavor;

/// Options for [`codify_with`].
#[derive(Clone, Debug)]
pub struct CodifyOptions {
    /// Indentation added per nesting level (default: four spaces)
    pub indent: String,
    /// Variable name the statements use for the document (default: `h`)
    pub binding: String,
}

impl Default for CodifyOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            binding: "h".to_string(),
        }
    }
}

impl CodifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom indentation unit.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Set the variable name used for the document.
    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = binding.into();
        self
    }
}

/// Codify a document with default options.
pub fn codify(doc: &Document) -> String {
    codify_with(doc, &CodifyOptions::default())
}

/// Codify a document into builder statements, one per line.
pub fn codify_with(doc: &Document, opts: &CodifyOptions) -> String {
    let arena = doc.arena.borrow();
    let mut codifier = Codifier {
        arena: &arena,
        flavor: doc.flavor(),
        opts,
        lines: Vec::new(),
    };

    let root_newlines = arena[doc.root]
        .get()
        .as_element()
        .is_none_or(|root| root.newlines);
    let newlines = if root_newlines {
        ""
    } else {
        ".with_newlines(false)"
    };
    codifier.lines.push(format!(
        "let {} = Document::{}(){newlines};",
        opts.binding,
        doc.flavor().constructor()
    ));

    codifier.write_children(doc.root, 0);
    codifier.lines.join("\n")
}

struct Codifier<'a> {
    arena: &'a Arena<NodeData>,
    flavor: Flavor,
    opts: &'a CodifyOptions,
    lines: Vec<String>,
}

impl Codifier<'_> {
    /// Children of `id` worth reproducing: elements and non-blank text.
    fn content(&self, id: NodeId) -> Vec<NodeId> {
        id.children(self.arena)
            .filter(|&child| match self.arena[child].get() {
                NodeData::Text(text) => !text.trim().is_empty(),
                NodeData::Element(_) => true,
            })
            .collect()
    }

    fn write_children(&mut self, id: NodeId, depth: usize) {
        // Adjacent text segments become a single raw_text statement, joined
        // the way the serializer separates this node's children.
        let arena = self.arena;
        let sep = match arena[id].get() {
            NodeData::Element(elem) if elem.newlines => "\n",
            _ => "",
        };
        let mut pending = String::new();
        for child in self.content(id) {
            match arena[child].get() {
                NodeData::Text(text) => {
                    if !pending.is_empty() {
                        pending.push_str(sep);
                    }
                    pending.push_str(text);
                }
                NodeData::Element(elem) => {
                    self.flush_text(&mut pending, depth);
                    self.write_element(child, elem, depth);
                }
            }
        }
        self.flush_text(&mut pending, depth);
    }

    fn flush_text(&mut self, pending: &mut String, depth: usize) {
        if pending.is_empty() {
            return;
        }
        let indent = self.opts.indent.repeat(depth);
        self.lines.push(format!(
            "{indent}{}.raw_text({:?});",
            self.opts.binding, pending
        ));
        pending.clear();
    }

    fn write_element(&mut self, id: NodeId, elem: &ElementData, depth: usize) {
        let arena = self.arena;
        let tag = elem.tag.as_deref().unwrap_or_default();
        let indent = self.opts.indent.repeat(depth);
        let binding = &self.opts.binding;
        let chain = self.config_chain(tag, elem);
        let content = self.content(id);

        let has_elements = content
            .iter()
            .any(|&child| matches!(arena[child].get(), NodeData::Element(_)));

        if !has_elements {
            match content.as_slice() {
                [] => {
                    self.lines
                        .push(format!("{indent}{binding}.tag({tag:?}){chain};"));
                    return;
                }
                [only] => {
                    if let NodeData::Text(text) = arena[*only].get() {
                        let call = content_call(text);
                        self.lines
                            .push(format!("{indent}{binding}.tag({tag:?}){call}{chain};"));
                        return;
                    }
                }
                _ => {}
            }
        }

        self.lines
            .push(format!("{indent}{binding}.tag({tag:?}){chain}.with(|_| {{"));
        self.write_children(id, depth + 1);
        self.lines.push(format!("{indent}}});"));
    }

    /// Attribute and newline configuration, as chained method calls.
    fn config_chain(&self, tag: &str, elem: &ElementData) -> String {
        let mut chain = String::new();
        for (name, value) in &elem.attrs {
            match value {
                Some(value) => {
                    chain.push_str(&format!(".attr({name:?}, {:?})", unescape(value)));
                }
                None => chain.push_str(&format!(".flag({name:?})")),
            }
        }
        if elem.newlines != self.flavor.newlines_for(tag) {
            chain.push_str(&format!(".newlines({})", elem.newlines));
        }
        chain
    }
}

/// `.content(..)` when re-escaping the decoded text gives it back, else `.raw_content(..)`.
fn content_call(text: &str) -> String {
    if is_canonical_text(text) {
        format!(".content({:?})", unescape(text))
    } else {
        format!(".raw_content({text:?})")
    }
}
