//! Fetching markup over HTTP.

use std::time::Duration;

use crate::{Document, Error, Flavor, parse_markup};

const USER_AGENT: &str = concat!("trellis/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch `url` and decode the body using the charset from its `Content-Type`.
///
/// One blocking request, no retries. Network failures, non-success statuses
/// and undecodable bodies are all returned as [`Error::Fetch`].
pub fn fetch_text(url: &str) -> Result<String, Error> {
    debug!(url, "fetching");

    let fetch_error = |err: reqwest::Error| Error::Fetch {
        url: url.to_owned(),
        reason: err.to_string(),
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(fetch_error)?;

    let text = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(fetch_error)?;

    debug!(url, bytes = text.len(), "fetched");
    Ok(text)
}

/// Fetch `url` and parse the body into a document of the given flavor.
pub fn fetch_markup(flavor: Flavor, url: &str) -> Result<Document, Error> {
    let text = fetch_text(url)?;
    Ok(parse_markup(flavor, &text))
}

impl Document {
    /// Fetch and parse a remote document; see [`fetch_markup`].
    pub fn from_url(flavor: Flavor, url: &str) -> Result<Self, Error> {
        fetch_markup(flavor, url)
    }
}
