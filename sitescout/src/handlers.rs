use clap::ArgMatches;
use colored::Colorize;
use sitescout_core::data::ResultStore;
use sitescout_core::report::{ReportFormat, render_report, write_result_blob};
use sitescout_discovery::domain;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

const DB_FILE: &str = "sitescout.db";
const BLOB_DIR: &str = "blobs";

// Helper functions for the discover handler

/// Load domains from either a file or a single domain argument
pub fn load_domains_from_source(
    domain_arg: Option<&String>,
    domains_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(domains_file_path) = domains_file {
        load_domains_from_file(domains_file_path)
    } else if let Some(domain_arg) = domain_arg {
        let candidate = domain::normalize(domain_arg);
        domain::validate(&candidate).map_err(|e| e.to_string())?;
        Ok(vec![candidate])
    } else {
        Err("Either --domain or --domains-file must be provided".to_string())
    }
}

/// Load and parse domains from a file
pub fn load_domains_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read domains file {}: {}", path.display(), e))?;

    let domains: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_domain_line)
        .collect();

    if domains.is_empty() {
        return Err(format!("No valid domains found in {}", path.display()));
    }

    Ok(domains)
}

/// Parse a single line as a bare domain, skipping anything that fails
/// validation
pub fn parse_domain_line(line: &str) -> Option<String> {
    let candidate = domain::normalize(line);
    if domain::validate(&candidate).is_ok() {
        return Some(candidate);
    }

    eprintln!("⚠️  Skipping invalid domain '{}'", line.trim());
    None
}

// Re-export discovery types and functions from sitescout-core
pub use sitescout_core::discovery::{
    DiscoveryOptions, DiscoveryProgressCallback, execute_discovery,
};
pub use sitescout_core::report::{extract_url_path, generate_discovery_report};

pub fn print_banner() {
    println!(
        "{}",
        r#"
     _ _
 ___(_) |_ ___ ___ __ ___ _  _| |_
(_-< |  _/ -_|_-</ _/ _ \ || |  _|
/__/_|\__\___/__/\__\___/\_,_|\__|
"#
        .bright_cyan()
    );
    println!("{}\n", "  whole-domain sitemap discovery".bright_white());
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().unwrap();
    let mut response = String::new();
    io::stdin().read_line(&mut response).unwrap();
    response.trim().to_lowercase()
}

/// Expand the configured directory and return the database path inside it
fn resolve_store_paths(config_arg: &str) -> (PathBuf, PathBuf, PathBuf) {
    let expanded = shellexpand::tilde(config_arg);
    let config_dir = PathBuf::from(expanded.as_ref());
    let db_path = config_dir.join(DB_FILE);
    let blob_dir = config_dir.join(BLOB_DIR);
    (config_dir, db_path, blob_dir)
}

fn open_store_or_exit(config_arg: &str) -> (ResultStore, PathBuf) {
    let (_, db_path, blob_dir) = resolve_store_paths(config_arg);

    if !ResultStore::exists(&db_path) {
        eprintln!(
            "✗ No database at {} (run `sitescout init` first)",
            db_path.display()
        );
        std::process::exit(1);
    }

    let store = match ResultStore::new(&db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ Failed to open database: {}", e);
            std::process::exit(1);
        }
    };
    (store, blob_dir)
}

pub fn handle_init(args: &ArgMatches) {
    print_divider();
    println!("{}", "  SITESCOUT INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let path_arg = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");
    let (config_dir, db_path, blob_dir) = resolve_store_paths(path_arg);

    println!("{} Parsed arguments", "✓".green().bold());
    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    // Handle existing database in force mode
    if force && ResultStore::exists(&db_path) {
        println!(
            "{} Deleting existing database (force mode)",
            "→".yellow().bold()
        );
        ResultStore::drop(&db_path);
        println!("{} Existing database removed", "✓".green().bold());
        println!();
    }

    if ResultStore::exists(&db_path) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Database already exists at:");
        println!(
            "  {} {}",
            "•".yellow(),
            db_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Would you like to overwrite it? [y/N]:");
        println!();

        if response != "y" && response != "yes" {
            println!("{} Keeping existing database", "→".blue());
            println!();
            return;
        }
        ResultStore::drop(&db_path);
        println!("{} Existing database removed", "✓".green().bold());
        println!();
    }

    println!("{} Creating directory structure...", "→".blue());
    fs::create_dir_all(&config_dir).expect("Failed to create config directory");
    println!(
        "  {} {}",
        "✓".green(),
        config_dir.display().to_string().bright_white()
    );
    fs::create_dir_all(&blob_dir).expect("Failed to create blob directory");
    println!(
        "  {} {}",
        "✓".green(),
        blob_dir.display().to_string().bright_white()
    );
    println!();

    println!("{} Creating database...", "→".blue());
    ResultStore::new(&db_path).expect("Failed to create database");
    println!(
        "{} Database initialized: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config directory: {}",
        "✓".green().bold(),
        config_dir.display().to_string().bright_white()
    );
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!();
}

pub async fn handle_discover(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let domain_arg = sub_matches.get_one::<String>("domain");
    let domains_file = sub_matches.get_one::<std::path::PathBuf>("domains-file");
    let max_depth = *sub_matches.get_one::<usize>("max-depth").unwrap_or(&10);
    let concurrency = sub_matches.get_one::<usize>("concurrency").copied();
    let format_arg = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let output = sub_matches.get_one::<std::path::PathBuf>("output");
    let no_store = sub_matches.get_flag("no-store");
    let config_arg = sub_matches.get_one::<String>("db").unwrap();

    let format = match ReportFormat::from_str(format_arg) {
        Some(format) => format,
        None => {
            eprintln!("✗ Unknown report format '{}'", format_arg);
            std::process::exit(1);
        }
    };

    // Load domains from source
    let domains = match load_domains_from_source(domain_arg, domains_file) {
        Ok(domains) => domains,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let store = if no_store {
        None
    } else {
        Some(open_store_or_exit(config_arg))
    };

    // Print discovery configuration
    println!("\n🗺️  Discovering sitemaps for {} domain(s)", domains.len());
    println!("Max index depth: {}", max_depth);
    match concurrency {
        Some(limit) => println!("Concurrency: {}\n", limit),
        None => println!("Concurrency: unbounded\n"),
    }

    let mut failures = 0usize;
    for target in &domains {
        let run_id = match store.as_ref() {
            Some((store, _)) => match store.create_run(target) {
                Ok(run_id) => Some(run_id),
                Err(e) => {
                    eprintln!("✗ Failed to record run for {}: {}", target, e);
                    std::process::exit(1);
                }
            },
            None => None,
        };

        let options = DiscoveryOptions {
            domain: target.clone(),
            max_depth,
            concurrency_limit: concurrency,
            show_progress: true,
        };

        let result = match execute_discovery(options, None).await {
            Ok(result) => result,
            Err(e) => {
                if let (Some((store, _)), Some(run_id)) = (store.as_ref(), run_id.as_ref())
                    && let Err(db_err) = store.fail_run(run_id)
                {
                    eprintln!("✗ Failed to mark run failed: {}", db_err);
                }
                eprintln!("✗ Discovery failed for {}: {}", target, e);
                failures += 1;
                continue;
            }
        };

        let blob_path = match store.as_ref() {
            Some((_, blob_dir)) => match write_result_blob(blob_dir, &result) {
                Ok(path) => Some(path),
                Err(e) => {
                    eprintln!("⚠️  Could not write result blob: {}", e);
                    None
                }
            },
            None => None,
        };

        if let (Some((store, _)), Some(run_id)) = (store.as_ref(), run_id.as_ref()) {
            let blob_str = blob_path.as_ref().map(|p| p.display().to_string());
            if let Err(e) = store.complete_run(run_id, &result, blob_str.as_deref()) {
                eprintln!("✗ Failed to store result for {}: {}", target, e);
                std::process::exit(1);
            }
        }

        println!("\n✓ Discovery complete for {}!\n", result.domain);

        let report = render_report(&result, &format);
        match output {
            Some(path) => {
                if let Err(e) = fs::write(path, &report) {
                    eprintln!("✗ Failed to write report to {}: {}", path.display(), e);
                    std::process::exit(1);
                }
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
            None => print!("{}", report),
        }
    }

    if failures > 0 {
        eprintln!("\n✗ {} of {} domain(s) failed", failures, domains.len());
        std::process::exit(1);
    }
}

pub fn handle_list(sub_matches: &ArgMatches) {
    let domain_filter = sub_matches.get_one::<String>("domain").map(String::as_str);
    let limit = *sub_matches.get_one::<usize>("limit").unwrap_or(&20);
    let config_arg = sub_matches.get_one::<String>("db").unwrap();

    let (store, _) = open_store_or_exit(config_arg);

    let runs = match store.list_runs(domain_filter, limit) {
        Ok(runs) => runs,
        Err(e) => {
            eprintln!("✗ Failed to list runs: {}", e);
            std::process::exit(1);
        }
    };

    if runs.is_empty() {
        println!("No discovery runs recorded yet.");
        return;
    }

    println!(
        "{:<38} {:<24} {:<10} {:>8}  {}",
        "RUN".bold(),
        "DOMAIN".bold(),
        "STATUS".bold(),
        "URLS".bold(),
        "STARTED".bold()
    );
    for run in runs {
        let status = match run.status.as_str() {
            "completed" => run.status.green(),
            "failed" => run.status.red(),
            _ => run.status.yellow(),
        };
        let urls = run
            .total_urls
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let started = chrono::DateTime::from_timestamp(run.started_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| run.started_at.to_string());
        println!(
            "{:<38} {:<24} {:<10} {:>8}  {}",
            run.id, run.domain, status, urls, started
        );
    }
}

pub fn handle_show(sub_matches: &ArgMatches) {
    let target = sub_matches.get_one::<String>("domain").unwrap();
    let config_arg = sub_matches.get_one::<String>("db").unwrap();
    let target = domain::normalize(target);

    let (store, _) = open_store_or_exit(config_arg);

    let record = match store.latest_for_domain(&target) {
        Ok(Some(record)) => record,
        Ok(None) => {
            println!("No completed runs for {} yet.", target);
            return;
        }
        Err(e) => {
            eprintln!("✗ Failed to query domain: {}", e);
            std::process::exit(1);
        }
    };

    let crawled = chrono::DateTime::from_timestamp(record.last_crawled, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| record.last_crawled.to_string());

    println!("# Summary:");
    println!("  Domain: {}", record.domain);
    println!("  Total URLs: {}", record.total_urls);
    if let Some(ref lastmod) = record.last_modified {
        println!("  Last modified: {}", lastmod);
    }
    println!("  Last crawled: {}", crawled);
    println!("  Run: {}", record.last_run_id);
    if let Some(ref blob) = record.blob_path {
        println!("  Blob: {}", blob);
    }
    println!();

    let urls = match store.get_urls_for_run(&record.last_run_id) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("✗ Failed to load URLs: {}", e);
            std::process::exit(1);
        }
    };
    for url in urls {
        println!("  {}", url);
    }
}

pub fn handle_export(sub_matches: &ArgMatches) {
    let run_id = sub_matches.get_one::<String>("run").unwrap();
    let output = sub_matches.get_one::<std::path::PathBuf>("output").unwrap();
    let config_arg = sub_matches.get_one::<String>("db").unwrap();

    let (store, _) = open_store_or_exit(config_arg);

    let run = match store.get_run(run_id) {
        Ok(Some(run)) => run,
        Ok(None) => {
            eprintln!("✗ No run with id {}", run_id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("✗ Failed to load run: {}", e);
            std::process::exit(1);
        }
    };

    let urls = match store.get_urls_for_run(&run.id) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("✗ Failed to load URLs: {}", e);
            std::process::exit(1);
        }
    };

    let crawl_time = chrono::DateTime::from_timestamp(
        run.completed_at.unwrap_or(run.started_at),
        0,
    )
    .map(|t| t.to_rfc3339())
    .unwrap_or_default();

    let export = serde_json::json!({
        "domain": run.domain,
        "status": run.status,
        "sitemapUrls": urls,
        "totalUrls": run.total_urls.unwrap_or(0),
        "lastModified": run.last_modified,
        "crawlTime": crawl_time,
    });

    let rendered = match serde_json::to_string_pretty(&export) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("✗ Failed to serialize export: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = fs::write(output, rendered) {
        eprintln!("✗ Failed to write {}: {}", output.display(), e);
        std::process::exit(1);
    }

    println!(
        "{} Exported run {} to {}",
        "✓".green().bold(),
        run.id,
        output.display()
    );
}
