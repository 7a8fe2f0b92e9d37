//! Graph command implementation.
//!
//! Loads a module and prints the reloadable modules reachable from it.

use crate::cli::{GlobalArgs, GraphArgs};
use crate::commands::utils;
use crate::error::Result;
use crate::{host, ui};

/// Execute the graph command.
pub fn execute(args: GraphArgs, globals: &GlobalArgs) -> Result<()> {
    let dir = utils::project_dir(globals)?;
    let config = utils::load_config(globals, &dir)?;
    let host = host::open(&config);

    let reloader = host.reloader();
    reloader.load(&args.module)?;
    let graph = reloader.graph(&args.module)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
    } else {
        ui::print_graph(&graph);
        ui::info(&format!(
            "{} modules, {} references",
            graph.len(),
            graph.edge_count()
        ));
    }
    Ok(())
}
