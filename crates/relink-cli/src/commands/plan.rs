//! Plan command implementation.
//!
//! Prints the order a reload of a module would run in, without running it.

use relink_graph::ModuleName;
use serde::Serialize;

use crate::cli::{GlobalArgs, PlanArgs};
use crate::commands::utils;
use crate::error::Result;
use crate::{host, ui};

#[derive(Serialize)]
struct PlanOutput<'a> {
    root: &'a ModuleName,
    order: &'a [ModuleName],
}

/// Execute the plan command.
pub fn execute(args: PlanArgs, globals: &GlobalArgs) -> Result<()> {
    let dir = utils::project_dir(globals)?;
    let config = utils::load_config(globals, &dir)?;
    let host = host::open(&config);

    let reloader = host.reloader();
    reloader.load(&args.module)?;
    let order = reloader.prepare_reload(&args.module)?;

    if args.json {
        let output = PlanOutput {
            root: order.root(),
            order: order.as_slice(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        ui::print_plan(&order);
    }
    Ok(())
}
