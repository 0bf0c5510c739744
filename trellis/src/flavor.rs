//! Markup flavors: HTML, XHTML and XML.

use facet::Facet;

use crate::serialize::{Serializer, Standard, Strict, VoidAware};

/// Tags whose content is broken onto separate lines by default in HTML and XHTML.
const BLOCK_TAGS: &[&str] = &["table", "ol", "ul", "dl", "span", "html", "head", "body"];

/// The markup variant a [`Document`](crate::Document) is built for.
///
/// The flavor is fixed when the document is created: it decides which tags
/// get line breaks by default and which serializer `render()` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Facet)]
#[repr(u8)]
pub enum Flavor {
    /// HTML; empty elements always get an end tag.
    #[default]
    Html,
    /// XHTML; void elements self-close.
    Xhtml,
    /// XML; every empty element self-closes and no tag breaks lines by default.
    Xml,
}

impl Flavor {
    /// Tag names that emit newlines by default under this flavor.
    pub fn block_tags(self) -> &'static [&'static str] {
        match self {
            Flavor::Html | Flavor::Xhtml => BLOCK_TAGS,
            Flavor::Xml => &[],
        }
    }

    /// Default newline flag for a freshly created `tag`.
    pub fn newlines_for(self, tag: &str) -> bool {
        self.block_tags().contains(&tag)
    }

    /// The serializer `Document::render` uses for this flavor.
    pub fn serializer(self) -> &'static dyn Serializer {
        match self {
            Flavor::Html => &Standard,
            Flavor::Xhtml => &VoidAware,
            Flavor::Xml => &Strict,
        }
    }

    /// Name of the `Document` constructor for this flavor, as written by codify.
    pub(crate) fn constructor(self) -> &'static str {
        match self {
            Flavor::Html => "html",
            Flavor::Xhtml => "xhtml",
            Flavor::Xml => "xml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tags() {
        assert!(Flavor::Html.newlines_for("table"));
        assert!(Flavor::Xhtml.newlines_for("ul"));
        assert!(!Flavor::Html.newlines_for("td"));
        assert!(!Flavor::Xml.newlines_for("table"));
    }

    #[test]
    fn test_block_tags_are_case_sensitive() {
        assert!(!Flavor::Html.newlines_for("TABLE"));
    }
}
