//! Common-path probing: HEAD requests against conventional feed locations.

use std::collections::HashSet;

use reqwest::header::CONTENT_TYPE;

use super::{is_feed_mime, mime_essence, DiscoveryMethod, FeedResult, FeedType};
use crate::fetch::FetchClient;
use crate::util::{validate_url, TargetUrl};

/// Conventional feed locations at the site root.
const ROOT_CANDIDATES: [&str; 7] = [
    "/feed", "/feeds", "/rss", "/rss.xml", "/feed.xml", "/atom.xml", "/index.xml",
];

/// Variants resolved relative to the target's own path, so feeds served
/// under a subpath (`/blog/` → `/blog/feed/`) are found too.
const RELATIVE_CANDIDATES: [&str; 7] = [
    "feed/", "feeds/", "rss/", "feed.xml", "rss.xml", "atom.xml", "index.xml",
];

/// One probe target: the candidate path as written (for the result title)
/// plus its resolved, re-validated URL.
struct Candidate {
    label: &'static str,
    url: TargetUrl,
}

/// Probes the conventional feed paths under `base`.
///
/// Never fails as a whole: candidates that don't resolve or don't pass
/// validation are dropped, and a probe that errors or answers with a
/// non-feed content type simply contributes nothing. All HEAD requests are
/// issued before any is awaited.
pub async fn probe(client: &FetchClient, base: &TargetUrl) -> Vec<FeedResult> {
    let candidates = build_candidates(base);
    let probes = candidates
        .into_iter()
        .map(|candidate| probe_candidate(client, candidate));

    futures::future::join_all(probes)
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// Resolves both candidate sets against the base and re-validates each
/// result. Root-absolute and relative variants can land on the same URL
/// (any base at the site root); those duplicates are collapsed here rather
/// than probed twice.
fn build_candidates(base: &TargetUrl) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for path in ROOT_CANDIDATES.into_iter().chain(RELATIVE_CANDIDATES) {
        let Ok(resolved) = base.as_url().join(path) else {
            continue;
        };
        // Same gate as the original target; a candidate resolving into a
        // disallowed range or port is never probed
        let Ok(validated) = validate_url(resolved.as_str()) else {
            continue;
        };
        if seen.insert(validated.as_str().to_owned()) {
            candidates.push(Candidate {
                label: path,
                url: validated,
            });
        }
    }

    candidates
}

async fn probe_candidate(client: &FetchClient, candidate: Candidate) -> Option<FeedResult> {
    let response = match client.head(&candidate.url).await {
        Ok(response) => response,
        Err(e) => {
            tracing::trace!(error = %e, "probe missed");
            return None;
        }
    };

    let mime = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(mime_essence)?;

    if !is_feed_mime(&mime) {
        return None;
    }

    Some(FeedResult {
        url: candidate.url.as_str().to_owned(),
        title: format!("{} feed", candidate.label),
        feed_type: FeedType::from_mime(&mime),
        discovery_method: DiscoveryMethod::CommonPath,
        description: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn validated(url: &str) -> TargetUrl {
        validate_url(url).unwrap()
    }

    fn trusted(url: &str) -> TargetUrl {
        TargetUrl::trusted_for_tests(Url::parse(url).unwrap())
    }

    // --- candidate construction ---

    #[test]
    fn test_candidates_cover_root_and_subpath() {
        let base = validated("https://backlog.com/ja/blog/");
        let candidates = build_candidates(&base);
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();

        assert!(urls.contains(&"https://backlog.com/feed"));
        assert!(urls.contains(&"https://backlog.com/ja/blog/feed/"));
        assert!(urls.contains(&"https://backlog.com/ja/blog/atom.xml"));
        // Root and relative sets are disjoint for a subpath base
        assert_eq!(candidates.len(), ROOT_CANDIDATES.len() + RELATIVE_CANDIDATES.len());
    }

    #[test]
    fn test_candidates_collapse_at_site_root() {
        let base = validated("https://example.com/");
        let candidates = build_candidates(&base);
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();

        // "/feed.xml" and "feed.xml" resolve identically at the root
        assert_eq!(
            urls.iter().filter(|u| **u == "https://example.com/feed.xml").count(),
            1
        );
        assert!(candidates.len() < ROOT_CANDIDATES.len() + RELATIVE_CANDIDATES.len());
    }

    #[test]
    fn test_candidates_relative_resolution_without_trailing_slash() {
        // RFC resolution: the last path segment is replaced
        let base = validated("https://example.com/ja/blog");
        let candidates = build_candidates(&base);
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert!(urls.contains(&"https://example.com/ja/feed/"));
    }

    #[test]
    fn test_candidates_revalidated_before_probing() {
        // A base that bypassed validation still can't produce probe targets
        let base = trusted("http://127.0.0.1:9/");
        assert!(build_candidates(&base).is_empty());
    }

    #[test]
    fn test_candidate_labels_keep_path_spelling() {
        let base = validated("https://example.com/blog/");
        let candidates = build_candidates(&base);
        let labels: Vec<&str> = candidates.iter().map(|c| c.label).collect();
        assert!(labels.contains(&"/feed"));
        assert!(labels.contains(&"feed/"));
    }

    // --- probing (internal entry points; the mock server lives on
    // --- localhost, which build_candidates would refuse) ---

    fn candidate(uri: &str, label: &'static str) -> Candidate {
        Candidate {
            label,
            url: trusted(uri),
        }
    }

    #[tokio::test]
    async fn test_probe_candidate_accepts_feed_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ja/blog/feed/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;

        let client = FetchClient::default();
        let uri = format!("{}/ja/blog/feed/", mock_server.uri());
        let result = probe_candidate(&client, candidate(&uri, "feed/"))
            .await
            .unwrap();

        assert_eq!(result.url, uri);
        assert_eq!(result.title, "feed/ feed");
        assert_eq!(result.feed_type, FeedType::Rss);
        assert_eq!(result.discovery_method, DiscoveryMethod::CommonPath);
    }

    #[tokio::test]
    async fn test_probe_candidate_atom_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/atom+xml; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let client = FetchClient::default();
        let uri = format!("{}/atom.xml", mock_server.uri());
        let result = probe_candidate(&client, candidate(&uri, "/atom.xml"))
            .await
            .unwrap();
        assert_eq!(result.feed_type, FeedType::Atom);
        assert_eq!(result.title, "/atom.xml feed");
    }

    #[tokio::test]
    async fn test_probe_candidate_rejects_html_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("content-type", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let client = FetchClient::default();
        let uri = format!("{}/feed", mock_server.uri());
        assert!(probe_candidate(&client, candidate(&uri, "/feed")).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_candidate_rejects_missing_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = FetchClient::default();
        let uri = format!("{}/rss", mock_server.uri());
        assert!(probe_candidate(&client, candidate(&uri, "/rss")).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_candidate_absorbs_fetch_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = FetchClient::default();
        let uri = format!("{}/feeds", mock_server.uri());
        assert!(probe_candidate(&client, candidate(&uri, "/feeds")).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_probe_does_not_abort_siblings() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = FetchClient::default();
        let good = candidate(&format!("{}/feed", mock_server.uri()), "/feed");
        let bad = candidate(&format!("{}/rss", mock_server.uri()), "/rss");

        let results = futures::future::join_all([
            probe_candidate(&client, good),
            probe_candidate(&client, bad),
        ])
        .await;

        let hits: Vec<_> = results.into_iter().flatten().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "/feed feed");
    }
}
