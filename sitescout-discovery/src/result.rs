use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final output of one discovery run. Built once after all candidate
/// sitemaps have been expanded and merged; immutable from then on.
///
/// `sitemap_urls` is sorted and contains no duplicates. An empty list is a
/// valid, non-error outcome for domains that publish no sitemaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub domain: String,
    pub sitemap_urls: Vec<String>,
    pub total_urls: usize,
    /// First non-empty `<lastmod>` seen across all fetched documents.
    pub last_modified: Option<String>,
    pub crawl_time: DateTime<Utc>,
}

impl AggregationResult {
    pub fn empty(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            sitemap_urls: Vec::new(),
            total_urls: 0,
            last_modified: None,
            crawl_time: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_has_zero_totals() {
        let result = AggregationResult::empty("example.com");
        assert_eq!(result.domain, "example.com");
        assert!(result.sitemap_urls.is_empty());
        assert_eq!(result.total_urls, 0);
        assert_eq!(result.last_modified, None);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = AggregationResult::empty("example.com");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"sitemapUrls\""));
        assert!(json.contains("\"totalUrls\""));
        assert!(json.contains("\"lastModified\""));
        assert!(json.contains("\"crawlTime\""));
    }
}
