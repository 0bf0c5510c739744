//! Handles, call-style configuration and scopes.

use indextree::NodeId;
use std::fmt;
use std::ops::Deref;

use crate::document::Document;
use crate::escape::{escape_attr, escape_text};
use crate::Error;

/// Handle to one element of a [`Document`].
///
/// Handles are cheap to copy. Creation methods on a handle (`tag`, `text`,
/// `newline`, ...) act on the document's attach point, not on the handle's
/// element; use [`Tag::child`] to nest directly.
#[derive(Clone, Copy)]
pub struct Tag<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl fmt::Debug for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tag")
            .field("name", &self.name())
            .field("id", &self.id)
            .finish()
    }
}

impl<'d> Tag<'d> {
    pub(crate) fn new(doc: &'d Document, id: NodeId) -> Self {
        Tag { doc, id }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    /// The document this element belongs to.
    pub fn document(&self) -> &'d Document {
        self.doc
    }

    /// Tag name of this element.
    pub fn name(&self) -> String {
        let arena = self.doc.arena.borrow();
        arena[self.id]
            .get()
            .as_element()
            .and_then(|elem| elem.tag.clone())
            .unwrap_or_default()
    }

    /// Create a `<name>` element at the document's attach point.
    pub fn tag(&self, name: &str) -> Tag<'d> {
        self.doc.tag(name)
    }

    /// Create a `<name>` element as the last child of this element.
    pub fn child(&self, name: &str) -> Tag<'d> {
        let id = self.doc.new_element(name);
        self.id.append(id, &mut self.doc.arena.borrow_mut());
        Tag::new(self.doc, id)
    }

    /// Append escaped text at the document's attach point.
    pub fn text(&self, text: &str) {
        self.doc.text(text);
    }

    /// Append unescaped markup at the document's attach point.
    pub fn raw_text(&self, markup: &str) {
        self.doc.raw_text(markup);
    }

    /// Append a line break at the document's attach point.
    pub fn newline(&self) {
        self.doc.newline();
    }

    /// Configure this element the way a call with positional and named
    /// arguments would.
    ///
    /// Positional arguments replace the whole content; named arguments set
    /// attributes. Calling a `read` element with no positional argument or a
    /// single integer is rejected: that looks like a stream read, not markup.
    pub fn call(self, args: Args) -> Result<Self, Error> {
        if self.name() == "read"
            && matches!(args.positional.as_slice(), [] | [Value::Int(_)])
        {
            return Err(Error::ReadMisuse {
                call: format!("read({})", args.describe_positional()),
            });
        }

        if !args.positional.is_empty() {
            let escape = !args.no_escape;
            self.replace_content(args.positional.iter().map(|value| {
                let text = value.to_string();
                if escape {
                    escape_text(&text).into_owned()
                } else {
                    text
                }
            }));
        }

        if let Some(newlines) = args.newlines {
            self.set_newlines(newlines);
        }

        for (name, value) in &args.named {
            self.set_attr(name, value.as_deref());
        }

        Ok(self)
    }

    /// Replace the content with a single escaped text segment.
    pub fn content(self, text: &str) -> Self {
        self.replace_content(std::iter::once(escape_text(text).into_owned()));
        self
    }

    /// Replace the content with a single unescaped markup segment.
    pub fn raw_content(self, markup: &str) -> Self {
        self.replace_content(std::iter::once(markup.to_owned()));
        self
    }

    /// Set an attribute; `klass` and `class_` are aliases for `class`.
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, Some(value));
        self
    }

    /// Set a valueless attribute such as `checked`.
    pub fn flag(self, name: &str) -> Self {
        self.set_attr(name, None);
        self
    }

    /// Set the `class` attribute.
    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    /// Override whether this element breaks lines around its content.
    pub fn newlines(self, newlines: bool) -> Self {
        self.set_newlines(newlines);
        self
    }

    /// Open a scope on this element: creations on the document land here
    /// until the returned guard is dropped.
    pub fn enter(self) -> Scope<'d> {
        self.doc.push_scope(self.id);
        Scope { tag: self }
    }

    /// Run `f` with this element as the attach point.
    pub fn with<R>(self, f: impl FnOnce(Tag<'d>) -> R) -> R {
        let _scope = self.enter();
        f(self)
    }

    fn replace_content(&self, texts: impl Iterator<Item = String>) {
        self.doc.clear_children(self.id);
        for text in texts {
            self.doc.push_text(self.id, text);
        }
    }

    fn set_attr(&self, name: &str, value: Option<&str>) {
        let key = match name {
            "klass" | "class_" => "class",
            other => other,
        };
        let value = value.map(|v| escape_attr(v).into_owned());
        self.doc.update_element(self.id, |elem| {
            elem.attrs.insert(key.to_owned(), value);
        });
    }

    fn set_newlines(&self, newlines: bool) {
        self.doc.update_element(self.id, |elem| elem.newlines = newlines);
    }
}

/// An open scope on a [`Tag`]; the scope closes when the guard is dropped.
///
/// Guards must be dropped in the reverse order they were created, which
/// ordinary block scoping gives for free.
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct Scope<'d> {
    tag: Tag<'d>,
}

impl<'d> Deref for Scope<'d> {
    type Target = Tag<'d>;

    fn deref(&self) -> &Tag<'d> {
        &self.tag
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.tag.doc.pop_scope(self.tag.id);
    }
}

/// A positional argument to [`Tag::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Int(n) => write!(f, "{n}"),
            // Debug keeps the point on whole numbers: `1.0`, not `1`.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&String> for Value {
    fn from(text: &String) -> Self {
        Value::Text(text.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Arguments for [`Tag::call`].
///
/// ```rust
/// use trellis::{Args, Document};
///
/// let h = Document::html();
/// h.tag("td")
///     .call(Args::new().arg("cell 1").attr("class_", "first"))
///     .unwrap();
/// assert_eq!(h.render(), r#"<td class="first">cell 1</td>"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Args {
    positional: Vec<Value>,
    named: Vec<(String, Option<String>)>,
    no_escape: bool,
    newlines: Option<bool>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add several positional arguments.
    pub fn args<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.positional.extend(values.into_iter().map(Into::into));
        self
    }

    /// Add a named argument, which becomes an attribute.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.named.push((name.to_owned(), Some(value.to_owned())));
        self
    }

    /// Add a named argument with no value, which becomes a valueless attribute.
    pub fn flag(mut self, name: &str) -> Self {
        self.named.push((name.to_owned(), None));
        self
    }

    /// Insert positional arguments without escaping them.
    pub fn no_escape(mut self) -> Self {
        self.no_escape = true;
        self
    }

    /// Override the element's newline behavior.
    pub fn newlines(mut self, newlines: bool) -> Self {
        self.newlines = Some(newlines);
        self
    }

    fn describe_positional(&self) -> String {
        self.positional
            .iter()
            .map(|value| match value {
                Value::Text(text) => format!("{text:?}"),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_replaces_content() {
        let h = Document::html();
        let td = h.tag("td").content("old");
        td.call(Args::new().arg("a < b").arg(2)).unwrap();
        assert_eq!(h.render(), "<td>a &lt; b2</td>");
    }

    #[test]
    fn test_float_argument_keeps_decimal_point() {
        let h = Document::html();
        h.tag("td").call(Args::new().arg(1.0).arg(" ").arg(2.5)).unwrap();
        assert_eq!(h.render(), "<td>1.0 2.5</td>");
    }

    #[test]
    fn test_call_without_positional_keeps_content() {
        let h = Document::html();
        h.tag("p")
            .content("kept")
            .call(Args::new().attr("id", "x"))
            .unwrap();
        assert_eq!(h.render(), r#"<p id="x">kept</p>"#);
    }

    #[test]
    fn test_call_no_escape() {
        let h = Document::html();
        h.tag("p")
            .call(Args::new().arg("<b>bold</b>").no_escape())
            .unwrap();
        assert_eq!(h.render(), "<p><b>bold</b></p>");
    }

    #[test]
    fn test_class_aliases() {
        let h = Document::html();
        h.tag("a")
            .call(Args::new().attr("klass", "one"))
            .unwrap()
            .attr("class_", "two");
        assert_eq!(h.render(), r#"<a class="two"></a>"#);
    }

    #[test]
    fn test_empty_attribute_value_is_kept() {
        let h = Document::html();
        h.tag("img").attr("alt", "").flag("ismap");
        assert_eq!(h.render(), r#"<img alt="" ismap></img>"#);
    }

    #[test]
    fn test_newlines_is_not_an_attribute() {
        let h = Document::html();
        h.tag("div")
            .call(Args::new().arg("x").newlines(true))
            .unwrap();
        assert_eq!(h.render(), "<div>\nx\n</div>");
    }

    #[test]
    fn test_read_misuse_is_rejected() {
        let h = Document::html();
        let err = h.tag("read").call(Args::new()).unwrap_err();
        assert!(matches!(err, Error::ReadMisuse { .. }));
        assert!(err.to_string().contains("read()"));

        let err = h.tag("read").call(Args::new().arg(1024)).unwrap_err();
        assert!(err.to_string().contains("read(1024)"));
    }

    #[test]
    fn test_read_with_text_is_markup() {
        let h = Document::html();
        h.tag("read").call(Args::new().arg("a book")).unwrap();
        h.tag("read").call(Args::new().arg(1).arg(2)).unwrap();
        assert_eq!(h.render(), "<read>a book</read>\n<read>12</read>");
    }

    #[test]
    fn test_child_nests_directly() {
        let h = Document::html().with_newlines(false);
        let p = h.tag("p");
        p.child("u").content("List");
        h.tag("hr");
        assert_eq!(h.render(), "<p><u>List</u></p><hr></hr>");
    }

    #[test]
    fn test_scope_guard_pops_on_drop() {
        let h = Document::html();
        {
            let _table = h.tag("table").enter();
            assert_eq!(h.depth(), 1);
        }
        assert_eq!(h.depth(), 0);
    }

    #[test]
    fn test_scope_pops_on_panic() {
        let h = Document::html();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            h.tag("div").with(|_| panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(h.depth(), 0);
    }
}
