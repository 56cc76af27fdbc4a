//! Destination URL helpers: scheme normalization and UTM tagging.
use url::Url;

use crate::UtmParams;

/// Trims the input and prefixes it with `https://` when it has no scheme.
///
/// Empty input stays empty.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();

    if trimmed.is_empty() || has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    }
}

/// Whether the input starts with `scheme://`, a `://` further in (e.g. in the query) doesn't count.
fn has_scheme(input: &str) -> bool {
    let scheme = match input.split_once("://") {
        Some((scheme, _)) => scheme,
        None => return false,
    };
    let mut chars = scheme.chars();

    chars.next().map_or(false, |first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Parses a normalized `http`/`https` URL
pub fn parse_web_url(input: &str) -> Option<Url> {
    let normalized = normalize_url(input);
    if normalized.is_empty() {
        return None;
    }

    Url::parse(&normalized)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

/// Sets the non-empty UTM parameters on the URL, overwriting any existing value for them.
///
/// All other query parameters are preserved before the UTM ones.
pub fn apply_utm(mut url: Url, utm: &UtmParams) -> Url {
    let params = utm.pairs();
    let kept = url
        .query_pairs()
        .filter(|(key, _)| !params.iter().any(|(param, _)| param == key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();

    url.set_query(None);
    if !kept.is_empty() || !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(kept)
            .extend_pairs(params);
    }

    url
}

/// The destination with the UTM parameters applied, or an empty string for an invalid destination.
pub fn tracked_url(destination: &str, utm: &UtmParams) -> String {
    parse_web_url(destination)
        .map(|url| apply_utm(url, utm).to_string())
        .unwrap_or_default()
}
