use commands::command_argument_builder;
use sitescout::handlers::{
    handle_discover, handle_export, handle_init, handle_list, handle_show, print_banner,
};

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("discover", primary_command)) => handle_discover(primary_command).await,
        Some(("list", primary_command)) => handle_list(primary_command),
        Some(("show", primary_command)) => handle_show(primary_command),
        Some(("export", primary_command)) => handle_export(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
