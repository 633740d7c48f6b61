// Report generation and JSON blob export for discovery results

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sitescout_discovery::AggregationResult;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Serialize a result as pretty JSON under
/// `{base_dir}/{domain}/{timestamp}/sitemap.json` and return the path.
pub fn write_result_blob(
    base_dir: &Path,
    result: &AggregationResult,
) -> std::io::Result<PathBuf> {
    let timestamp = result.crawl_time.format("%Y%m%dT%H%M%SZ").to_string();
    let dir = base_dir.join(&result.domain).join(timestamp);
    fs::create_dir_all(&dir)?;

    let path = dir.join("sitemap.json");
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, result).map_err(std::io::Error::from)?;
    Ok(path)
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Render a result in the requested format.
pub fn render_report(result: &AggregationResult, format: &ReportFormat) -> String {
    match format {
        ReportFormat::Text => generate_discovery_report(result),
        ReportFormat::Json => {
            serde_json::to_string_pretty(result).unwrap_or_else(|_| String::from("{}"))
        }
    }
}

/// Generate a text report for a discovery result
pub fn generate_discovery_report(result: &AggregationResult) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Domain: {}\n", result.domain));
    report.push_str(&format!("  Total URLs: {}\n", result.total_urls));
    if let Some(ref lastmod) = result.last_modified {
        report.push_str(&format!("  Last modified: {}\n", lastmod));
    }
    report.push_str(&format!(
        "  Crawl time: {}\n",
        result.crawl_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group URLs by host; BTreeMap keeps the listing stable
    let mut by_host: BTreeMap<String, Vec<&String>> = BTreeMap::new();
    for url in &result.sitemap_urls {
        if let Ok(parsed) = Url::parse(url)
            && let Some(host) = parsed.host_str()
        {
            by_host.entry(host.to_string()).or_default().push(url);
        }
    }

    for (host, urls) in by_host.iter() {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} URL(s)\n\n", urls.len()));

        for url in urls {
            report.push_str(&format!("  {}\n", extract_url_path(url)));
        }
        report.push('\n');
    }

    report
}
