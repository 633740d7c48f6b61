use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, info};

use crate::fetcher::Fetcher;

/// Conventional sitemap locations, probed alongside whatever robots.txt
/// advertises. Each path also gets a gzipped variant.
pub const SITEMAP_PATHS: [&str; 18] = [
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemaps.xml",
    "/sitemap/index.xml",
    "/sitemap/sitemap.xml",
    "/sitemap1.xml",
    "/sitemap2.xml",
    "/sitemap3.xml",
    "/sitemap.xml.gz",
    "/sitemap_index.xml.gz",
    "/sitemap-index.xml.gz",
    "/sitemaps.xml.gz",
    "/sitemap/index.xml.gz",
    "/sitemap/sitemap.xml.gz",
    "/sitemap1.xml.gz",
    "/sitemap2.xml.gz",
    "/sitemap3.xml.gz",
];

/// Finds candidate sitemap URLs for a domain: robots.txt `Sitemap:`
/// directives plus concurrent HEAD probes of the conventional paths.
///
/// Either pass failing wholesale just means it contributes nothing; an
/// empty candidate set is a valid outcome.
pub struct Discoverer {
    fetcher: Fetcher,
    base_url: Option<String>,
}

impl Discoverer {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            base_url: None,
        }
    }

    /// Override the `https://{domain}` origin that candidate URLs are built
    /// from. Used by tests pointing at a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Candidate sitemap URLs for `domain`, deduplicated by exact string
    /// equality. Never fails: unreachable robots.txt and all-404 probes
    /// yield an empty set.
    pub async fn find_candidates(&self, domain: &str) -> HashSet<String> {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", domain));

        let mut candidates: HashSet<String> = HashSet::new();

        // Pass 1: robots.txt directives.
        let robots_url = format!("{}/robots.txt", base);
        if let Some(body) = self.fetcher.fetch_text(&robots_url).await {
            for url in sitemap_directives(&body) {
                debug!("robots.txt advertises sitemap: {}", url);
                candidates.insert(url);
            }
        } else {
            debug!("no robots.txt for {}", domain);
        }

        // Pass 2: conventional paths, all probes in flight at once.
        let probes = SITEMAP_PATHS.iter().map(|path| {
            let url = format!("{}{}", base, path);
            let fetcher = self.fetcher.clone();
            async move { fetcher.probe(&url).await.then_some(url) }
        });
        for url in join_all(probes).await.into_iter().flatten() {
            candidates.insert(url);
        }

        info!(
            "found {} sitemap candidate(s) for {}",
            candidates.len(),
            domain
        );
        candidates
    }
}

/// Extract `Sitemap:` directive values from a robots.txt body. The
/// directive name is matched case-insensitively and the value is split on
/// the first colon only, so `https://` URLs survive intact.
pub fn sitemap_directives(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let (name, value) = line.trim().split_once(':')?;
            if !name.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}
