use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use sitescout_discovery::error::Result;
use sitescout_discovery::{Aggregator, AggregationResult, Fetcher, domain};
use tracing::info;

/// Options for configuring a discovery run
pub struct DiscoveryOptions {
    pub domain: String,
    pub max_depth: usize,
    pub concurrency_limit: Option<usize>,
    pub show_progress: bool,
}

impl DiscoveryOptions {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            max_depth: 10,
            concurrency_limit: None,
            show_progress: false,
        }
    }
}

/// Callback for reporting discovery progress
pub type DiscoveryProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Run a full discovery for one domain: normalize and validate the input,
/// find candidate sitemaps, expand and aggregate them.
///
/// The only error paths are invalid domain syntax and HTTP client
/// construction; a domain with no sitemaps at all resolves to a successful
/// empty result.
pub async fn execute_discovery(
    options: DiscoveryOptions,
    progress_callback: Option<DiscoveryProgressCallback>,
) -> Result<AggregationResult> {
    let DiscoveryOptions {
        domain: raw_domain,
        max_depth,
        concurrency_limit,
        show_progress,
    } = options;

    let domain = domain::normalize(&raw_domain);
    domain::validate(&domain)?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message(format!("Discovering sitemaps for {}...", domain));
        Some(pb)
    } else {
        None
    };

    if let Some(ref callback) = progress_callback {
        callback(format!("Discovering sitemaps for {}", domain));
    }

    let mut aggregator = Aggregator::new(Fetcher::new()?).with_max_depth(max_depth);
    if let Some(limit) = concurrency_limit {
        aggregator = aggregator.with_concurrency_limit(limit);
    }

    let result = aggregator.discover(&domain).await?;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Discovery complete! {} unique URL(s) found",
            result.total_urls
        ));
    }
    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Found {} URL(s) across sitemaps for {}",
            result.total_urls, domain
        ));
    }

    info!(
        "discovery finished for {}: {} URL(s), lastmod {:?}",
        domain, result.total_urls, result.last_modified
    );
    Ok(result)
}
