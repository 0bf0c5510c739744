//! Markup parsing on top of html5ever's tokenizer.
//!
//! Only the tokenizer is used, not the HTML5 tree builder: the tree builder
//! inserts `tbody`, `html`, `head` and friends, which would change the shape
//! of documents this crate rendered itself. Tokens drive the ordinary builder
//! instead, with start tags opening scopes and end tags closing them.
//!
//! The tokenizer lowercases names and reports `checked` exactly like
//! `checked=""`. A cursor over the source text reads each start tag back as it
//! was written, so names keep their case and valueless attributes stay
//! valueless.

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Doctype, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts,
};
use indextree::NodeId;
use std::cell::{Cell, RefCell};
use tendril::StrTendril;

use crate::document::{Document, NodeData};
use crate::escape::{escape_attr, escape_text};
use crate::serialize::is_void_element;
use crate::Flavor;

/// Parse markup text into a document of the given flavor.
///
/// Never fails: the tokenizer recovers from malformed input the way browsers
/// do, stray end tags are ignored and unclosed elements end with the input.
///
/// # Example
///
/// ```rust
/// use trellis::{Flavor, parse_markup};
///
/// let doc = parse_markup(Flavor::Html, "<p class=\"intro\">Hello <b>world</b></p>");
/// assert_eq!(doc.render(), "<p class=\"intro\">Hello <b>world</b></p>");
/// ```
pub fn parse_markup(flavor: Flavor, markup: &str) -> Document {
    debug!(?flavor, bytes = markup.len(), "parsing markup");

    let input = BufferQueue::default();
    input.push_back(StrTendril::from(markup));

    let sink = BuilderSink::new(flavor, markup);
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.finish()
}

impl Document {
    /// Parse markup text into a new document; see [`parse_markup`].
    pub fn from_markup(flavor: Flavor, markup: &str) -> Self {
        parse_markup(flavor, markup)
    }
}

/// What follows a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    /// Another child of the same parent.
    Item,
    /// An end tag.
    Close,
    /// End of input.
    Eof,
}

/// TokenSink that feeds tokens into a [`Document`].
struct BuilderSink<'a> {
    doc: Document,

    /// The markup being tokenized, for recovering what the tokens normalize away.
    source: SourceCursor<'a>,

    /// Character tokens not yet attached.
    pending: RefCell<String>,

    /// Inside `script` or `style`, whose text is kept unescaped.
    raw: Cell<bool>,
}

impl<'a> BuilderSink<'a> {
    fn new(flavor: Flavor, markup: &'a str) -> Self {
        BuilderSink {
            doc: Document::new(flavor),
            source: SourceCursor::new(markup),
            pending: RefCell::new(String::new()),
            raw: Cell::new(false),
        }
    }

    fn finish(self) -> Document {
        self.doc.truncate_scopes(0);
        self.doc
    }

    /// Attach pending text to the current scope.
    ///
    /// A newline-enabled parent is rendered with a `\n` after its start tag,
    /// between children and before its end tag. One such newline is dropped
    /// at each end of the run so re-rendering does not add them twice.
    fn flush_text(&self, next: Next) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if pending.is_empty() {
            return;
        }

        let parent = self.doc.attach_point();
        let (is_root, newlines, has_children) = {
            let arena = self.doc.arena.borrow();
            let (is_root, newlines) = match arena[parent].get() {
                NodeData::Element(elem) => (elem.tag.is_none(), elem.newlines),
                NodeData::Text(_) => (false, false),
            };
            (is_root, newlines, parent.children(&arena).next().is_some())
        };

        let mut text = pending.as_str();
        if newlines {
            if !is_root || has_children {
                text = text.strip_prefix('\n').unwrap_or(text);
            }
            let separated = match next {
                Next::Item => true,
                Next::Close | Next::Eof => !is_root,
            };
            if separated {
                text = text.strip_suffix('\n').unwrap_or(text);
            }
        }
        if text.is_empty() {
            return;
        }

        let stored = if self.raw.get() {
            text.to_owned()
        } else {
            escape_text(text).into_owned()
        };
        self.doc.push_text(parent, stored);
    }

    fn start_tag(&self, tag: Tag) -> TokenSinkResult<()> {
        let lowered: &str = &tag.name;
        let written = self.source.start_tag(lowered);
        let name = written.as_ref().map_or(lowered, |raw| raw.name.as_str());

        // XML has no valueless attributes; `Strict` writes them as `key=""`.
        let keep_valueless = self.doc.flavor() != Flavor::Xml;
        let element = self.doc.tag(name);
        self.doc.update_element(element.id(), |elem| {
            for attr in &tag.attrs {
                let lowered: &str = &attr.name.local;
                let raw_attr = written.as_ref().and_then(|raw| raw.attr(lowered));
                let value = match raw_attr {
                    Some((_, false)) if keep_valueless => None,
                    _ => Some(escape_attr(&attr.value).into_owned()),
                };
                let name = raw_attr.map_or(lowered, |(name, _)| name.as_str());
                elem.attrs.insert(name.to_owned(), value);
            }
        });

        let is_void = self.doc.flavor() != Flavor::Xml && is_void_element(name);
        if tag.self_closing || is_void {
            return TokenSinkResult::Continue;
        }

        self.doc.push_scope(element.id());
        match lowered {
            "script" => {
                self.raw.set(true);
                TokenSinkResult::RawData(RawKind::ScriptData)
            }
            "style" => {
                self.raw.set(true);
                TokenSinkResult::RawData(RawKind::Rawtext)
            }
            "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
            _ => TokenSinkResult::Continue,
        }
    }

    fn end_tag(&self, tag: Tag) {
        self.raw.set(false);
        let name: &str = &tag.name;
        self.source.end_tag(name);

        let open = self.doc.open_scopes();
        let matching = {
            let arena = self.doc.arena.borrow();
            open.iter().rposition(|&id| {
                tag_name(&arena, id).is_some_and(|open| open.eq_ignore_ascii_case(name))
            })
        };

        match matching {
            Some(depth) => self.doc.truncate_scopes(depth),
            None if self.doc.flavor() != Flavor::Xml && is_void_element(name) => {
                self.close_void(name);
            }
            None => {
                trace!(tag = name, "ignoring stray end tag");
            }
        }
    }

    /// A void element never opens a scope, so its end tag arrives with its
    /// content already attached as following siblings. Move that content
    /// back under the last void element of that name.
    fn close_void(&self, name: &str) {
        let parent = self.doc.attach_point();
        let mut arena = self.doc.arena.borrow_mut();
        let Some(void) = parent
            .children(&arena)
            .filter(|&child| {
                tag_name(&arena, child).is_some_and(|tag| tag.eq_ignore_ascii_case(name))
            })
            .last()
        else {
            trace!(tag = name, "ignoring stray end tag");
            return;
        };

        let content: Vec<NodeId> = void.following_siblings(&arena).skip(1).collect();
        trace!(tag = name, moved = content.len(), "closing void element");
        for node in content {
            node.detach(&mut arena);
            void.append(node, &mut arena);
        }
    }

    fn push_raw(&self, markup: String) {
        self.doc.push_text(self.doc.attach_point(), markup);
    }
}

fn tag_name(arena: &indextree::Arena<NodeData>, id: NodeId) -> Option<&str> {
    arena[id].get().as_element()?.tag.as_deref()
}

/// A start tag as written in the source.
#[derive(Debug)]
struct RawTag {
    name: String,
    /// Attribute names as written, and whether each was given a value.
    attrs: Vec<(String, bool)>,
}

impl RawTag {
    fn attr(&self, lowered: &str) -> Option<&(String, bool)> {
        self.attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(lowered))
    }
}

/// Position in the source text, advanced as tags and declarations are seen.
///
/// Tokens arrive in source order, so the next `<name` at or after the cursor
/// is the tag the tokenizer just reported.
struct SourceCursor<'a> {
    source: &'a str,
    pos: Cell<usize>,
}

impl<'a> SourceCursor<'a> {
    fn new(source: &'a str) -> Self {
        SourceCursor {
            source,
            pos: Cell::new(0),
        }
    }

    /// Read the next start tag named `lowered` (compared ignoring ASCII case).
    fn start_tag(&self, lowered: &str) -> Option<RawTag> {
        let (name_start, name_end) = self.find_tag("<", lowered)?;
        let (tag, end) = read_tag(self.source, name_start, name_end);
        self.pos.set(end);
        Some(tag)
    }

    /// Move past the next end tag named `lowered`.
    ///
    /// Keeps markup-looking text inside `script` from being mistaken for the
    /// next start tag.
    fn end_tag(&self, lowered: &str) {
        if let Some((name_start, name_end)) = self.find_tag("</", lowered) {
            let (_, end) = read_tag(self.source, name_start, name_end);
            self.pos.set(end);
        }
    }

    /// Find `open` directly followed by `lowered` and the end of the name.
    /// Returns the span of the name.
    fn find_tag(&self, open: &str, lowered: &str) -> Option<(usize, usize)> {
        let source = self.source;
        let mut at = self.pos.get();
        while let Some(offset) = source.get(at..)?.find(open) {
            let name_start = at + offset + open.len();
            let name_end = name_start + lowered.len();
            let found = source
                .get(name_start..name_end)
                .is_some_and(|name| name.eq_ignore_ascii_case(lowered))
                && source[name_end..]
                    .bytes()
                    .next()
                    .is_none_or(|b| b.is_ascii_whitespace() || b == b'/' || b == b'>');
            if found {
                return Some((name_start, name_end));
            }
            at = name_start;
        }
        None
    }

    /// Move past the next comment, doctype or processing instruction.
    fn skip_declaration(&self) {
        let at = self.pos.get();
        let Some(rest) = self.source.get(at..) else {
            return;
        };
        let Some(start) = [rest.find("<!"), rest.find("<?")].into_iter().flatten().min() else {
            return;
        };

        let decl = &rest[start..];
        let len = if decl.starts_with("<!--") {
            decl[2..].find("-->").map_or(decl.len(), |end| end + 5)
        } else {
            decl.find('>').map_or(decl.len(), |end| end + 1)
        };
        self.pos.set(at + start + len);
    }
}

/// Read the attributes of the tag whose name spans `name_start..name_end`.
/// Returns the tag and the position just past its `>`.
fn read_tag(source: &str, name_start: usize, name_end: usize) -> (RawTag, usize) {
    let bytes = source.as_bytes();
    let skip_whitespace = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
            i += 1;
        }
        i
    };

    let mut tag = RawTag {
        name: source[name_start..name_end].to_owned(),
        attrs: Vec::new(),
    };
    let mut i = name_end;
    loop {
        while bytes
            .get(i)
            .is_some_and(|&b| b.is_ascii_whitespace() || b == b'/')
        {
            i += 1;
        }
        match bytes.get(i) {
            None => return (tag, bytes.len()),
            Some(b'>') => return (tag, i + 1),
            Some(_) => {}
        }

        // An attribute name may start with `=`.
        let attr_start = i;
        i += 1;
        while bytes
            .get(i)
            .is_some_and(|&b| !matches!(b, b'=' | b'>' | b'/') && !b.is_ascii_whitespace())
        {
            i += 1;
        }
        let name = &source[attr_start..i];

        i = skip_whitespace(i);
        let has_value = bytes.get(i) == Some(&b'=');
        if has_value {
            i = skip_whitespace(i + 1);
            match bytes.get(i) {
                Some(&(quote @ (b'"' | b'\''))) => {
                    i += 1;
                    while bytes.get(i).is_some_and(|&b| b != quote) {
                        i += 1;
                    }
                    i = (i + 1).min(bytes.len());
                }
                _ => {
                    while bytes
                        .get(i)
                        .is_some_and(|&b| b != b'>' && !b.is_ascii_whitespace())
                    {
                        i += 1;
                    }
                }
            }
        }
        tag.attrs.push((name.to_owned(), has_value));
    }
}

fn doctype_markup(doctype: &Doctype) -> String {
    let mut out = String::from("<!DOCTYPE");
    if let Some(name) = &doctype.name {
        out.push(' ');
        out.push_str(name);
    }
    match (&doctype.public_id, &doctype.system_id) {
        (Some(public), Some(system)) => {
            out.push_str(&format!(" PUBLIC \"{public}\" \"{system}\""));
        }
        (Some(public), None) => out.push_str(&format!(" PUBLIC \"{public}\"")),
        (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{system}\"")),
        (None, None) => {}
    }
    out.push('>');
    out
}

fn comment_markup(text: &str) -> String {
    // `<?xml ...?>` reaches us as a bogus comment.
    if text.starts_with('?') && text.ends_with('?') {
        format!("<{text}>")
    } else {
        format!("<!--{text}-->")
    }
}

impl TokenSink for BuilderSink<'_> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => self.pending.borrow_mut().push_str(&text),
            Token::NullCharacterToken => {}
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => {
                    self.flush_text(Next::Item);
                    return self.start_tag(tag);
                }
                TagKind::EndTag => {
                    self.flush_text(Next::Close);
                    self.end_tag(tag);
                }
            },
            Token::CommentToken(text) => {
                self.flush_text(Next::Item);
                self.source.skip_declaration();
                self.push_raw(comment_markup(&text));
            }
            Token::DoctypeToken(doctype) => {
                self.flush_text(Next::Item);
                self.source.skip_declaration();
                self.push_raw(doctype_markup(&doctype));
            }
            Token::EOFToken => self.flush_text(Next::Eof),
            Token::ParseError(_message) => {
                trace!(line = _line_number, message = %_message, "tokenizer recovered");
            }
        }
        TokenSinkResult::Continue
    }
}
