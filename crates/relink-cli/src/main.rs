//! relink CLI - dependency-ordered, all-or-nothing module reloads.
//!
//! Parses arguments, sets up logging and colors, and dispatches to the
//! command implementations.

use clap::Parser;
use miette::Result;
use relink_cli::{cli, commands, error, logger, ui};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let globals = args.globals();
    let result = match args.command {
        cli::Command::Graph(graph_args) => commands::graph_execute(graph_args, &globals),
        cli::Command::Plan(plan_args) => commands::plan_execute(plan_args, &globals),
        cli::Command::Reload(reload_args) => commands::reload_execute(reload_args, &globals),
        cli::Command::Check(check_args) => commands::check_execute(check_args, &globals),
    };

    result.map_err(error::cli_error_to_miette)
}
