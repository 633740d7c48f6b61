pub mod aggregate;
pub mod discover;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod parse;
pub mod result;

pub use aggregate::Aggregator;
pub use discover::Discoverer;
pub use error::DiscoverError;
pub use fetcher::Fetcher;
pub use parse::{SitemapNode, UrlEntry};
pub use result::AggregationResult;
