use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitescout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitescout")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the sitescout result store on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the sitescout database and exports")
                        .default_value("~/.config/sitescout/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Forces the overwriting of any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("discover")
                .about(
                    "Discover and aggregate every sitemap URL for a domain: robots.txt \
                directives, conventional sitemap paths, and recursive sitemap-index expansion.",
                )
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(false)
                        .help("The bare domain to discover (e.g. example.com)")
                        .conflicts_with("domains-file"),
                )
                .arg(
                    arg!(-D --"domains-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of domains to discover")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("domain"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Maximum sitemap-index nesting depth to follow")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-c --"concurrency" <LIMIT>)
                        .required(false)
                        .help("Cap on concurrent sitemap fetches (default: unbounded)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"no-store")
                        .required(false)
                        .help("Skip persisting the result to the local store")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Sitescout config directory holding the database")
                        .default_value("~/.config/sitescout/"),
                ),
        )
        .subcommand(
            command!("list")
                .about("List stored discovery runs")
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(false)
                        .help("Only show runs for this domain"),
                )
                .arg(
                    arg!(-n --"limit" <COUNT>)
                        .required(false)
                        .help("Maximum number of runs to show")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Sitescout config directory holding the database")
                        .default_value("~/.config/sitescout/"),
                ),
        )
        .subcommand(
            command!("show")
                .about("Show the latest stored result for a domain")
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(true)
                        .help("The domain to show"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Sitescout config directory holding the database")
                        .default_value("~/.config/sitescout/"),
                ),
        )
        .subcommand(
            command!("export")
                .about("Export a stored discovery run as JSON")
                .arg(
                    arg!(-r --"run" <RUN_ID>)
                        .required(true)
                        .help("The run id to export (see `sitescout list`)"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(true)
                        .help("Where to write the JSON export")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Sitescout config directory holding the database")
                        .default_value("~/.config/sitescout/"),
                ),
        )
}
