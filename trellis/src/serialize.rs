//! Serializers for HTML, XHTML and XML output.
//!
//! All three walk the same tree and differ only in how they close empty
//! elements and render valueless attributes:
//!
//! - [`Standard`] never self-closes: `<x></x>`
//! - [`VoidAware`] self-closes the HTML void elements (`<br />`) and nothing else
//! - [`Strict`] self-closes every empty element and always quotes attribute values
//!
//! Text is written exactly as stored; escaping happened when it was inserted.

use indextree::{Arena, NodeId};
use std::fmt::{self, Write};

use crate::document::{Document, NodeData};

/// How an element is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementForm {
    /// `<x ...>content</x>`, or `<x ...></x>` when empty.
    OpenClose,
    /// `<x ... />`; content, if any, is not written.
    SelfClosing,
}

/// A strategy for turning a [`Document`] into text.
pub trait Serializer {
    /// Pick the closing form for an element named `tag`.
    fn element_form(&self, tag: &str, has_content: bool) -> ElementForm;

    /// Write one attribute, including its leading space.
    fn write_attr(&self, out: &mut dyn Write, name: &str, value: Option<&str>) -> fmt::Result {
        match value {
            Some(value) => write!(out, " {name}=\"{value}\""),
            None => write!(out, " {name}"),
        }
    }

    /// Serialize a whole document to a string.
    fn serialize(&self, doc: &Document) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_document(doc, &mut out);
        out
    }

    /// Serialize a whole document into `out`.
    fn write_document(&self, doc: &Document, out: &mut dyn Write) -> fmt::Result {
        let arena = doc.arena.borrow();
        let mut writer = Writer {
            out,
            arena: &arena,
            policy: self,
        };
        writer.write_node(doc.root)
    }
}

/// HTML 4 style output: every element gets an end tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl Serializer for Standard {
    fn element_form(&self, _tag: &str, _has_content: bool) -> ElementForm {
        ElementForm::OpenClose
    }
}

/// XHTML output: void elements self-close, everything else gets an end tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidAware;

/// Elements that never have content in XHTML.
const VOID_ELEMENTS: &[&str] = &[
    "base", "meta", "link", "hr", "br", "param", "img", "area", "input", "col", "colgroup",
    "basefont", "isindex", "frame",
];

/// Check if a tag is a void element (case-insensitive).
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(tag))
}

impl Serializer for VoidAware {
    fn element_form(&self, tag: &str, _has_content: bool) -> ElementForm {
        if is_void_element(tag) {
            ElementForm::SelfClosing
        } else {
            ElementForm::OpenClose
        }
    }
}

/// XML output: any empty element self-closes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl Serializer for Strict {
    fn element_form(&self, _tag: &str, has_content: bool) -> ElementForm {
        if has_content {
            ElementForm::OpenClose
        } else {
            ElementForm::SelfClosing
        }
    }

    fn write_attr(&self, out: &mut dyn Write, name: &str, value: Option<&str>) -> fmt::Result {
        write!(out, " {name}=\"{}\"", value.unwrap_or_default())
    }
}

struct Writer<'a, S: Serializer + ?Sized> {
    out: &'a mut dyn Write,
    arena: &'a Arena<NodeData>,
    policy: &'a S,
}

impl<S: Serializer + ?Sized> Writer<'_, S> {
    fn write_node(&mut self, id: NodeId) -> fmt::Result {
        let elem = match self.arena[id].get() {
            NodeData::Text(text) => return self.out.write_str(text),
            NodeData::Element(elem) => elem,
        };

        let sep = if elem.newlines { "\n" } else { "" };
        let children: Vec<NodeId> = id.children(self.arena).collect();

        // The root only contributes its children.
        let Some(tag) = &elem.tag else {
            return self.write_children(&children, sep);
        };

        write!(self.out, "<{tag}")?;
        for (name, value) in &elem.attrs {
            self.policy.write_attr(self.out, name, value.as_deref())?;
        }

        match self.policy.element_form(tag, !children.is_empty()) {
            ElementForm::SelfClosing => self.out.write_str(" />"),
            ElementForm::OpenClose => {
                self.out.write_char('>')?;
                if !children.is_empty() {
                    self.out.write_str(sep)?;
                    self.write_children(&children, sep)?;
                    self.out.write_str(sep)?;
                }
                write!(self.out, "</{tag}>")
            }
        }
    }

    fn write_children(&mut self, children: &[NodeId], sep: &str) -> fmt::Result {
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                self.out.write_str(sep)?;
            }
            self.write_node(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_x() -> Document {
        let doc = Document::html();
        doc.tag("x");
        doc
    }

    #[test]
    fn test_empty_element_per_variant() {
        let doc = empty_x();
        assert_eq!(Standard.serialize(&doc), "<x></x>");
        assert_eq!(VoidAware.serialize(&doc), "<x></x>");
        assert_eq!(Strict.serialize(&doc), "<x />");
    }

    #[test]
    fn test_void_elements_self_close() {
        let doc = Document::xhtml().with_newlines(false);
        doc.tag("br");
        doc.tag("IMG").attr("src", "a.png");
        doc.tag("p");
        assert_eq!(
            VoidAware.serialize(&doc),
            r#"<br /><IMG src="a.png" /><p></p>"#
        );
    }

    #[test]
    fn test_void_element_with_content_still_self_closes() {
        let doc = Document::xhtml();
        doc.tag("br").content("ignored");
        assert_eq!(doc.render(), "<br />");
    }

    #[test]
    fn test_valueless_attributes() {
        let doc = Document::html();
        doc.tag("input").attr("type", "checkbox").flag("checked");
        assert_eq!(
            Standard.serialize(&doc),
            r#"<input type="checkbox" checked></input>"#
        );
        assert_eq!(
            VoidAware.serialize(&doc),
            r#"<input type="checkbox" checked />"#
        );
        assert_eq!(
            Strict.serialize(&doc),
            r#"<input type="checkbox" checked="" />"#
        );
    }

    #[test]
    fn test_newline_placement() {
        let doc = Document::html();
        {
            let _ul = doc.tag("ul").enter();
            doc.tag("li").content("one");
            doc.tag("li").content("two");
        }
        assert_eq!(
            doc.render(),
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>"
        );
    }

    #[test]
    fn test_empty_block_element_has_no_newlines() {
        let doc = Document::html();
        doc.tag("table");
        assert_eq!(doc.render(), "<table></table>");
    }

    #[test]
    fn test_xml_defaults_to_no_newlines() {
        let doc = Document::xml();
        {
            let _root = doc.tag("table").enter();
            doc.tag("row").content("a");
            doc.tag("empty");
        }
        assert_eq!(doc.render(), "<table><row>a</row><empty /></table>");
    }

    #[test]
    fn test_display_matches_render() {
        let doc = Document::xhtml();
        doc.tag("hr");
        assert_eq!(doc.to_string(), doc.render());
    }
}
