//! Formatting of durations, graphs, reload plans and reload results.

use std::fmt::Write as _;
use std::time::Duration;

use owo_colors::OwoColorize;
use relink_graph::{DependencyGraph, LinearOrder};

use super::colors_enabled;
use crate::host::ExtensionReload;

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use relink_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn dim(text: &str) -> String {
    if colors_enabled() {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

fn bold(text: &str) -> String {
    if colors_enabled() {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// One line per module, by depth then name, with its direct children.
pub(crate) fn render_graph(graph: &DependencyGraph) -> String {
    let mut records: Vec<_> = graph.records().collect();
    records.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.name.cmp(&b.name)));

    let mut out = String::new();
    for record in records {
        let indent = "  ".repeat(record.depth);
        let _ = write!(out, "{indent}{}", bold(record.name.as_str()));
        let _ = write!(out, " {}", dim(&format!("(depth {})", record.depth)));
        if !record.children.is_empty() {
            let children: Vec<_> = record.children.iter().map(|child| child.as_str()).collect();
            let _ = write!(out, " -> {}", children.join(", "));
        }
        out.push('\n');
    }
    out
}

/// The order modules are reloaded in, the root marked as the host's step.
pub(crate) fn render_plan(order: &LinearOrder) -> String {
    let mut out = String::new();
    for (index, module) in order.iter().enumerate() {
        let _ = write!(out, "{:>3}. {}", index + 1, module);
        if module == order.root() {
            let _ = write!(out, " {}", dim("(reloaded by host)"));
        }
        out.push('\n');
    }
    out
}

pub(crate) fn render_reload(reload: &ExtensionReload) -> String {
    let mut out = String::new();
    if let Some(children) = &reload.children {
        for (module, generation) in &children.reloaded {
            let _ = writeln!(out, "  {module} {}", dim(&format!("(generation {generation})")));
        }
    }
    let _ = writeln!(
        out,
        "  {} {}",
        bold(reload.name.as_str()),
        dim(&format!("(generation {})", reload.generation))
    );
    out
}

/// Print a dependency graph to stdout.
pub fn print_graph(graph: &DependencyGraph) {
    print!("{}", render_graph(graph));
}

/// Print a reload plan to stdout.
pub fn print_plan(order: &LinearOrder) {
    print!("{}", render_plan(order));
}

/// Print the modules an extension reload replaced to stdout.
pub fn print_reload(reload: &ExtensionReload) {
    print!("{}", render_reload(reload));
}
