//! Result formatting.

use anyhow::Result;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use groupsearch_core::{GroupOutcome, GroupsResult};

use crate::FormatArg;

/// Print groups in the requested format
pub fn print_groups(result: &GroupsResult, format: FormatArg) -> Result<()> {
    match format {
        FormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        FormatArg::Table => {
            if result.is_empty() {
                println!("{}", "No groups.".dimmed());
            } else {
                println!("{}", groups_table(result));
            }
        }
    }
    Ok(())
}

/// One row per hit; the group cell is only filled on a group's first row.
pub fn groups_table(result: &GroupsResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(
        ["group", "id", "score", "payload"]
            .into_iter()
            .map(|c| Cell::new(c).fg(Color::Cyan)),
    );

    for group in &result.groups {
        for (i, hit) in group.hits.iter().enumerate() {
            let key = if i == 0 {
                group.id.value.to_string()
            } else {
                String::new()
            };
            let payload = hit
                .payload
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            table.add_row(vec![
                Cell::new(key),
                Cell::new(hit.id),
                Cell::new(format!("{:.4}", hit.score)),
                Cell::new(payload),
            ]);
        }
    }

    table
}

/// Print termination and counters to stderr
pub fn print_stats(outcome: &GroupOutcome) {
    let stats = &outcome.stats;
    eprintln!(
        "{} groups, termination: {:?}, rounds: {}, examined: {}, accepted: {}, rejected: {}",
        outcome.result.len(),
        outcome.termination,
        stats.rounds,
        stats.candidates_examined,
        stats.accepted,
        stats.rejected()
    );
}
