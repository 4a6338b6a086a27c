//! Client entry parameter.
//!
//! The rental page is opened from a URL carrying the tag identifier in its
//! query string, e.g. `https://watch.example/?nfctagid=04A2B9`. The CLI
//! accepts that URL as-is, a bare query string, or the bare identifier.

use reqwest::Url;
use tracing::warn;

/// Query parameter the deployed rental page reads the tag from.
pub const DEFAULT_TAG_PARAM: &str = "nfctagid";

/// Extract the tag identifier from an entry URL.
///
/// Only `http(s)` URLs and bare `?query` strings are searched for `param`;
/// `None` when it is missing or empty. Anything else without URL punctuation
/// is the identifier itself, colons included (`AB:CD:EF:01`).
pub fn tag_from_entry(entry: &str, param: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    let url = if entry.starts_with('?') {
        Url::parse("http://localhost/")
            .and_then(|base| base.join(entry))
            .ok()
    } else {
        Url::parse(entry)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
    };

    match url {
        Some(url) => {
            let tag = url
                .query_pairs()
                .find(|(key, _)| key == param)
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty());
            if tag.is_none() {
                warn!(%url, param, "Entry URL carries no tag");
            }
            tag
        }
        None if entry.contains(['?', '=', '&', '/']) => {
            warn!(entry, "Entry is neither a URL nor a tag id");
            None
        }
        None => Some(entry.to_string()),
    }
}
