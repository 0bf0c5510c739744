//! Fluent HTML, XHTML and XML building.
//!
//! trellis provides:
//! - **Builder**: tags created by name land in the innermost open scope
//! - **Serialization**: HTML, XHTML and XML output with their own empty-element rules
//! - **Codify**: turn any tree, including parsed markup, back into builder calls
//! - **Parsing and fetching**: load existing markup through html5ever's tokenizer
//!
//! # Example
//!
//! ```rust
//! use trellis::Document;
//!
//! let h = Document::html();
//! h.tag("table").with(|_| {
//!     h.tag("tr").with(|_| {
//!         h.tag("td").content("cell 1");
//!         h.tag("td").content("cell 2");
//!     });
//! });
//! h.tag("p").child("u").content("List");
//!
//! assert_eq!(
//!     h.render(),
//!     "<table>\n<tr><td>cell 1</td><td>cell 2</td></tr>\n</table>\n<p><u>List</u></p>"
//! );
//! ```

#[macro_use]
mod tracing_macros;

mod builder;
pub mod codify;
mod document;
pub mod escape;
mod error;
#[cfg(feature = "fetch")]
mod fetch;
mod flavor;
mod parser;
pub mod serialize;

pub use builder::{Args, Scope, Tag, Value};
pub use codify::{CodifyOptions, codify, codify_with};
pub use document::Document;
pub use error::Error;
#[cfg(feature = "fetch")]
pub use fetch::{fetch_markup, fetch_text};
pub use flavor::Flavor;
pub use parser::parse_markup;
pub use serialize::{Serializer, Standard, Strict, VoidAware};
