use facet::Facet;

/// Errors surfaced by the builder and the fetch adapter.
#[derive(Facet, Debug)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum Error {
    /// you appear to be calling {call} on a markup builder
    ReadMisuse { call: String },

    /// cannot append a node inside its own subtree
    AppendAncestor,

    /// failed to fetch {url}: {reason}
    Fetch { url: String, reason: String },
}
