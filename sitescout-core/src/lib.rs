pub mod data;
pub mod discovery;
pub mod report;

pub use data::{DomainRecord, ResultStore, RunRecord};
pub use discovery::{DiscoveryOptions, DiscoveryProgressCallback, execute_discovery};
pub use report::{
    ReportFormat, extract_url_path, generate_discovery_report, render_report, write_result_blob,
};
