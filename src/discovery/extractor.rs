//! Autodiscovery `<link>` extraction from fetched HTML.
//!
//! Two passes share the same acceptance rules: a DOM pass over a parsed
//! tree, and a bounded manual scan for markup too broken for the tree to
//! preserve. Neither pass touches the network; callers resolve and validate
//! anything they intend to fetch.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use super::{is_feed_mime, mime_essence, DiscoveryMethod, FeedResult, FeedType};
use crate::util::strip_control_chars;

/// Title reported when a feed link carries no usable `title` attribute.
pub const DEFAULT_TITLE: &str = "Untitled feed";

/// A `<link` occurrence with no `>` within this many bytes is skipped
/// outright by the scan pass.
const MAX_TAG_LENGTH: usize = 1000;

/// Finds feed autodiscovery links in an HTML document.
///
/// A `<link>` qualifies when its `rel` list contains `alternate`
/// (case-insensitive), its `type` is one of the feed MIME types (parameters
/// stripped), and its `href` is non-empty and resolves against `base`.
///
/// html5ever recovers from malformed input instead of failing, so the tree
/// never refuses to parse — but markup broken enough (unclosed comments or
/// scripts swallowing the `<head>`) can still erase the link elements from
/// the recovered tree. When the DOM pass comes back empty, the bounded
/// manual scan gets a second look at the raw text.
pub fn extract(html: &str, base: &Url) -> Vec<FeedResult> {
    let results = extract_from_dom(html, base);
    if !results.is_empty() {
        return results;
    }
    extract_from_scan(html, base)
}

fn extract_from_dom(html: &str, base: &Url) -> Vec<FeedResult> {
    let Ok(selector) = Selector::parse("link") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for element in document.select(&selector) {
        let Some(rel) = element.value().attr("rel") else {
            continue;
        };
        if !rel_is_alternate(rel) {
            continue;
        }
        let Some(mime) = element.value().attr("type").map(mime_essence) else {
            continue;
        };
        if !is_feed_mime(&mime) {
            continue;
        }
        let Some(href) = element.value().attr("href").filter(|h| !h.is_empty()) else {
            continue;
        };
        // Malformed href: skip the candidate silently
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        results.push(make_result(resolved, element.value().attr("title"), &mime));
    }

    results
}

/// Manual scan pass: split on `<link` (ASCII case-insensitive), bound each
/// segment, and re-run the acceptance rules with the linear attribute
/// scanner. Results are deduplicated by resolved URL within this call.
fn extract_from_scan(html: &str, base: &Url) -> Vec<FeedResult> {
    // Byte-for-byte lowercase so indices line up with the original text
    let lower = html.to_ascii_lowercase();
    let bytes = lower.as_bytes();

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    let mut search_from = 0;

    while let Some(pos) = lower[search_from..].find("<link") {
        let start = search_from + pos;
        let cap = (start + MAX_TAG_LENGTH).min(bytes.len());

        // No '>' within the cap: drop the whole segment
        let Some(gt) = bytes[start..cap].iter().position(|&b| b == b'>') else {
            search_from = start + "<link".len();
            continue;
        };

        let end = start + gt + 1;
        let tag = &html[start..end];
        let tag_lower = &lower[start..end];
        search_from = end;

        let Some(rel) = attr_value(tag_lower, "rel") else {
            continue;
        };
        if !rel_is_alternate(rel) {
            continue;
        }
        let Some(mime) = attr_value(tag_lower, "type").map(mime_essence) else {
            continue;
        };
        if !is_feed_mime(&mime) {
            continue;
        }
        let Some(href) = attr_value(tag, "href").filter(|h| !h.is_empty()) else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };

        if seen.insert(resolved.to_string()) {
            results.push(make_result(resolved, attr_value(tag, "title"), &mime));
        }
    }

    results
}

fn rel_is_alternate(rel: &str) -> bool {
    rel.split_whitespace()
        .any(|token| token.eq_ignore_ascii_case("alternate"))
}

fn make_result(resolved: Url, title: Option<&str>, mime: &str) -> FeedResult {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| strip_control_chars(t).into_owned())
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned());

    FeedResult {
        url: resolved.to_string(),
        title,
        feed_type: FeedType::from_mime(mime),
        discovery_method: DiscoveryMethod::MetaTag,
        description: None,
    }
}

/// Extracts a quoted attribute value from a tag string.
///
/// Scans for the attribute name (case-insensitive, at a token boundary),
/// skips spaces/tabs, requires `=`, skips spaces/tabs, requires `"` or `'`,
/// and returns the value up to the matching closing quote. Any missing
/// piece means "not found". Single left-to-right pass, no backtracking.
fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let name_lower = name.to_ascii_lowercase();
    let bytes = tag.as_bytes();
    let mut from = 0;

    while let Some(pos) = lower[from..].find(&name_lower) {
        let start = from + pos;
        from = start + 1;

        // Reject matches inside a longer attribute name (e.g. "href" in
        // "data-href" or "hreflang")
        if start > 0 {
            let prev = bytes[start - 1];
            if prev.is_ascii_alphanumeric() || prev == b'-' || prev == b'_' {
                continue;
            }
        }

        let mut i = start + name_lower.len();
        while bytes.get(i).is_some_and(|&b| b == b' ' || b == b'\t') {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while bytes.get(i).is_some_and(|&b| b == b' ' || b == b'\t') {
            i += 1;
        }
        let quote = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => continue,
        };
        i += 1;

        let rest = &tag[i..];
        let close = rest.find(quote as char)?;
        return Some(&rest[..close]);
    }

    None
}
