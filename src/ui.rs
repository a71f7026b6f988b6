//! Terminal output for command results and failures.
//!
//! Summaries go to stdout so they can be captured; errors and warnings go
//! to stderr.

use crate::restore::StatisticsSnapshot;

/// Width of box separators.
const BOX_WIDTH: usize = 60;

/// Print an error box with a title and an optional detail block.
///
/// ```text
/// ============================================================
/// Restore failed
/// ============================================================
///
/// <detail>
/// ```
pub fn print_error_box(title: &str, detail: Option<&str>) {
    eprintln!("\n{}", "=".repeat(BOX_WIDTH));
    eprintln!("{title}");
    eprintln!("{}", "=".repeat(BOX_WIDTH));

    if let Some(detail) = detail
        && !detail.is_empty()
    {
        eprintln!("\n{detail}");
    }
}

/// Print configuration warnings, one per entry.
pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Render restore counters as aligned `name: value` lines.
pub fn format_statistics(statistics: &StatisticsSnapshot) -> String {
    let rows: Vec<(&str, u64)> = statistics.iter().collect();
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    rows.iter()
        .map(|(name, value)| format!("  {name:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the restore statistics block.
pub fn print_statistics(statistics: &StatisticsSnapshot) {
    println!("{}", "-".repeat(BOX_WIDTH));
    println!("{}", format_statistics(statistics));
    println!("{}", "-".repeat(BOX_WIDTH));
}
