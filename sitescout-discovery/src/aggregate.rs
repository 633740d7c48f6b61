use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::discover::Discoverer;
use crate::domain;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::parse::{self, SitemapNode};
use crate::result::AggregationResult;

/// Sitemap-index chains deeper than this are cut off. Real sites rarely
/// nest more than two or three levels; the cap exists so a cyclic or
/// hostile index tree still terminates.
const DEFAULT_MAX_DEPTH: usize = 10;

/// Expands candidate sitemaps into the full page-URL set for a domain.
///
/// Every top-level candidate is processed concurrently and in isolation: a
/// candidate that fails to fetch or parse contributes zero URLs and never
/// disturbs the others. Index documents are expanded level by level with a
/// per-candidate visited set and depth cap, so cyclic references terminate.
///
/// Fan-out is unbounded by default; `with_concurrency_limit` gates all
/// content fetches through a semaphore for deployments that need to be
/// gentler on the target host.
pub struct Aggregator {
    fetcher: Fetcher,
    base_url: Option<String>,
    max_depth: usize,
    concurrency_limit: Option<usize>,
}

impl Aggregator {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            base_url: None,
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency_limit: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Override the `https://{domain}` origin used during candidate
    /// discovery. Used by tests pointing at a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Discover and aggregate every sitemap URL for `domain`: validate the
    /// domain, find candidates, expand and merge them.
    ///
    /// "No sitemaps found" is success with an empty result; the only error
    /// is invalid domain syntax, raised before any request goes out.
    pub async fn discover(&self, domain: &str) -> Result<AggregationResult> {
        domain::validate(domain)?;

        let mut discoverer = Discoverer::new(self.fetcher.clone());
        if let Some(base) = &self.base_url {
            discoverer = discoverer.with_base_url(base.clone());
        }
        let candidates = discoverer.find_candidates(domain).await;
        Ok(self.aggregate(candidates, domain).await)
    }

    /// Fetch, expand and merge all candidate sitemaps into one result.
    pub async fn aggregate(
        &self,
        candidates: HashSet<String>,
        domain: &str,
    ) -> AggregationResult {
        let semaphore = self
            .concurrency_limit
            .map(|limit| Arc::new(Semaphore::new(limit)));

        // Sorted candidate order makes the first-wins lastmod deterministic.
        let mut ordered: Vec<String> = candidates.into_iter().collect();
        ordered.sort();

        let expansions = ordered.iter().map(|candidate| {
            let candidate = candidate.clone();
            let semaphore = semaphore.clone();
            async move { self.expand_candidate(&candidate, domain, semaphore).await }
        });
        let outcomes = join_all(expansions).await;

        let mut merged: HashSet<String> = HashSet::new();
        let mut last_modified: Option<String> = None;
        for (urls, lastmod) in outcomes {
            merged.extend(urls);
            if last_modified.is_none() {
                last_modified = lastmod;
            }
        }

        let mut sitemap_urls: Vec<String> = merged.into_iter().collect();
        sitemap_urls.sort();
        let total_urls = sitemap_urls.len();

        info!("aggregated {} unique URL(s) for {}", total_urls, domain);
        AggregationResult {
            domain: domain.to_string(),
            sitemap_urls,
            total_urls,
            last_modified,
            crawl_time: Utc::now(),
        }
    }

    /// Expand one top-level candidate, following sitemap-index children
    /// level by level. Returns the in-domain URLs it yielded and the first
    /// `<lastmod>` seen in any of its documents.
    async fn expand_candidate(
        &self,
        candidate: &str,
        domain: &str,
        semaphore: Option<Arc<Semaphore>>,
    ) -> (HashSet<String>, Option<String>) {
        let mut urls: HashSet<String> = HashSet::new();
        let mut last_modified: Option<String> = None;

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(candidate.to_string());
        let mut frontier = vec![candidate.to_string()];
        let mut depth = 0;

        while !frontier.is_empty() && depth < self.max_depth {
            let fetches = frontier.iter().map(|url| {
                let url = url.clone();
                let semaphore = semaphore.clone();
                async move {
                    let _permit = match semaphore.as_ref() {
                        Some(s) => s.acquire().await.ok(),
                        None => None,
                    };
                    let body = self.fetcher.fetch_text(&url).await;
                    (url, body)
                }
            });

            let mut next_frontier: Vec<String> = Vec::new();
            for (url, body) in join_all(fetches).await {
                let Some(body) = body else {
                    debug!("sitemap source yielded nothing: {}", url);
                    continue;
                };

                if last_modified.is_none() {
                    last_modified = parse::first_lastmod(&body);
                }

                match parse::parse_document(&body) {
                    Some(SitemapNode::Index { children }) => {
                        debug!("{} is an index with {} child(ren)", url, children.len());
                        for child in children {
                            if visited.insert(child.clone()) {
                                next_frontier.push(child);
                            }
                        }
                    }
                    Some(SitemapNode::UrlSet { entries }) => {
                        for entry in entries {
                            if domain::in_domain(&entry.loc, domain) {
                                urls.insert(entry.loc);
                            }
                        }
                    }
                    None => {
                        debug!("structured parse failed for {}, using loc scan", url);
                        for loc in parse::extract_locs(&body) {
                            if domain::in_domain(&loc, domain) {
                                urls.insert(loc);
                            }
                        }
                    }
                }
            }

            frontier = next_frontier;
            depth += 1;
        }

        if !frontier.is_empty() {
            warn!(
                "sitemap index depth cap ({}) reached under {}; {} child(ren) skipped",
                self.max_depth,
                candidate,
                frontier.len()
            );
        }

        (urls, last_modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn urlset(locs: &[&str]) -> String {
        let mut body = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for loc in locs {
            body.push_str(&format!("  <url><loc>{}</loc></url>\n", loc));
        }
        body.push_str("</urlset>");
        body
    }

    fn index(children: &[&str]) -> String {
        let mut body = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for child in children {
            body.push_str(&format!("  <sitemap><loc>{}</loc></sitemap>\n", child));
        }
        body.push_str("</sitemapindex>");
        body
    }

    async fn mount_xml(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(Fetcher::new().unwrap())
    }

    /// Mock-server URLs have host 127.0.0.1, so tests run the in-domain
    /// filter against that host.
    const TEST_DOMAIN: &str = "127.0.0.1";

    #[tokio::test]
    async fn expands_index_into_disjoint_children() {
        let server = MockServer::start().await;
        let base = server.uri();

        mount_xml(
            &server,
            "/sitemap.xml",
            index(&[
                &format!("{}/sitemap-a.xml", base),
                &format!("{}/sitemap-b.xml", base),
            ]),
        )
        .await;
        mount_xml(
            &server,
            "/sitemap-a.xml",
            urlset(&[
                &format!("{}/a1", base),
                &format!("{}/a2", base),
                &format!("{}/a3", base),
            ]),
        )
        .await;
        mount_xml(
            &server,
            "/sitemap-b.xml",
            urlset(&[
                &format!("{}/b1", base),
                &format!("{}/b2", base),
                &format!("{}/b3", base),
                &format!("{}/b4", base),
            ]),
        )
        .await;

        let candidates = HashSet::from([format!("{}/sitemap.xml", base)]);
        let result = aggregator().aggregate(candidates, TEST_DOMAIN).await;

        assert_eq!(result.total_urls, 7);
        assert_eq!(result.sitemap_urls.len(), 7);
    }

    #[tokio::test]
    async fn isolates_failing_candidates() {
        let server = MockServer::start().await;
        let base = server.uri();

        mount_xml(
            &server,
            "/good.xml",
            urlset(&[
                &format!("{}/p1", base),
                &format!("{}/p2", base),
                &format!("{}/p3", base),
                &format!("{}/p4", base),
                &format!("{}/p5", base),
            ]),
        )
        .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let candidates = HashSet::from([
            format!("{}/good.xml", base),
            format!("{}/dead-1.xml", base),
            format!("{}/dead-2.xml", base),
            format!("{}/dead-3.xml", base),
        ]);
        let result = aggregator().aggregate(candidates, TEST_DOMAIN).await;

        assert_eq!(result.total_urls, 5);
        for url in &result.sitemap_urls {
            assert!(url.contains("/p"), "unexpected URL {}", url);
        }
    }

    #[tokio::test]
    async fn filters_out_of_domain_urls() {
        let server = MockServer::start().await;
        let base = server.uri();

        mount_xml(
            &server,
            "/sitemap.xml",
            urlset(&[
                &format!("{}/keep", base),
                "https://elsewhere.org/drop",
                "https://cdn.elsewhere.org/drop2",
            ]),
        )
        .await;

        let candidates = HashSet::from([format!("{}/sitemap.xml", base)]);
        let result = aggregator().aggregate(candidates, TEST_DOMAIN).await;

        assert_eq!(result.sitemap_urls, vec![format!("{}/keep", base)]);
        assert_eq!(result.total_urls, 1);
    }

    #[tokio::test]
    async fn dedupes_urls_across_candidates() {
        let server = MockServer::start().await;
        let base = server.uri();

        let shared = urlset(&[&format!("{}/same", base), &format!("{}/other", base)]);
        mount_xml(&server, "/one.xml", shared.clone()).await;
        mount_xml(&server, "/two.xml", shared).await;

        let candidates = HashSet::from([
            format!("{}/one.xml", base),
            format!("{}/two.xml", base),
        ]);
        let result = aggregator().aggregate(candidates, TEST_DOMAIN).await;

        assert_eq!(result.total_urls, 2);
        let unique: HashSet<&String> = result.sitemap_urls.iter().collect();
        assert_eq!(unique.len(), result.sitemap_urls.len());
    }

    #[tokio::test]
    async fn falls_back_to_loc_scan_on_broken_xml() {
        let server = MockServer::start().await;
        let base = server.uri();

        let broken = format!(
            "<urlset><url><loc>{}/a</loc>\nthis is not closing properly <url><loc>{}/b</loc>",
            base, base
        );
        Mock::given(method("GET"))
            .and(path("/broken.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(broken))
            .mount(&server)
            .await;

        let candidates = HashSet::from([format!("{}/broken.xml", base)]);
        let result = aggregator().aggregate(candidates, TEST_DOMAIN).await;

        assert_eq!(
            result.sitemap_urls,
            vec![format!("{}/a", base), format!("{}/b", base)]
        );
    }

    #[tokio::test]
    async fn terminates_on_cyclic_index() {
        let server = MockServer::start().await;
        let base = server.uri();

        // a.xml and b.xml reference each other forever.
        mount_xml(
            &server,
            "/a.xml",
            index(&[&format!("{}/b.xml", base)]),
        )
        .await;
        mount_xml(
            &server,
            "/b.xml",
            index(&[&format!("{}/a.xml", base)]),
        )
        .await;

        let candidates = HashSet::from([format!("{}/a.xml", base)]);
        let result = aggregator().aggregate(candidates, TEST_DOMAIN).await;
        assert_eq!(result.total_urls, 0);
    }

    #[tokio::test]
    async fn captures_first_lastmod() {
        let server = MockServer::start().await;
        let base = server.uri();

        let body = format!(
            "<urlset><url><loc>{}/x</loc><lastmod>2024-03-01</lastmod></url>\
             <url><loc>{}/y</loc><lastmod>2024-04-01</lastmod></url></urlset>",
            base, base
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let candidates = HashSet::from([format!("{}/sitemap.xml", base)]);
        let result = aggregator().aggregate(candidates, TEST_DOMAIN).await;
        assert_eq!(result.last_modified.as_deref(), Some("2024-03-01"));
    }

    #[tokio::test]
    async fn empty_candidates_is_success() {
        let result = aggregator().aggregate(HashSet::new(), "example.com").await;
        assert_eq!(result.total_urls, 0);
        assert!(result.sitemap_urls.is_empty());
        assert_eq!(result.last_modified, None);
    }

    #[tokio::test]
    async fn aggregation_is_idempotent() {
        let server = MockServer::start().await;
        let base = server.uri();

        mount_xml(
            &server,
            "/sitemap.xml",
            urlset(&[&format!("{}/1", base), &format!("{}/2", base)]),
        )
        .await;

        let candidates = HashSet::from([format!("{}/sitemap.xml", base)]);
        let first = aggregator()
            .aggregate(candidates.clone(), TEST_DOMAIN)
            .await;
        let second = aggregator().aggregate(candidates, TEST_DOMAIN).await;
        assert_eq!(first.sitemap_urls, second.sitemap_urls);
    }

    #[tokio::test]
    async fn concurrency_limit_still_finds_everything() {
        let server = MockServer::start().await;
        let base = server.uri();

        mount_xml(
            &server,
            "/sitemap.xml",
            index(&[
                &format!("{}/c1.xml", base),
                &format!("{}/c2.xml", base),
                &format!("{}/c3.xml", base),
            ]),
        )
        .await;
        for i in 1..=3 {
            mount_xml(
                &server,
                &format!("/c{}.xml", i),
                urlset(&[&format!("{}/page{}", base, i)]),
            )
            .await;
        }

        let candidates = HashSet::from([format!("{}/sitemap.xml", base)]);
        let result = Aggregator::new(Fetcher::new().unwrap())
            .with_concurrency_limit(1)
            .aggregate(candidates, TEST_DOMAIN)
            .await;
        assert_eq!(result.total_urls, 3);
    }

    #[tokio::test]
    async fn discover_rejects_invalid_domain_before_any_fetch() {
        let result = aggregator().discover("not a domain").await;
        assert!(matches!(
            result,
            Err(crate::error::DiscoverError::InvalidDomain(_))
        ));
    }

    #[tokio::test]
    async fn discover_end_to_end_with_empty_site() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = Aggregator::new(Fetcher::new().unwrap())
            .with_base_url(server.uri())
            .discover("example.com")
            .await
            .unwrap();
        assert_eq!(result.domain, "example.com");
        assert_eq!(result.total_urls, 0);
    }
}
