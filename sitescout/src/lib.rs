// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    load_domains_from_file,
    load_domains_from_source,
    parse_domain_line,
};

// Re-export discovery functionality from sitescout-core
pub use sitescout_core::discovery::{
    execute_discovery, DiscoveryOptions, DiscoveryProgressCallback,
};
pub use sitescout_core::report::{extract_url_path, generate_discovery_report};
