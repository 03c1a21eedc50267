//! Output formatting helpers for human-readable and JSON output.

use tokenscope::{BatchResult, Outcome};

/// Longest token prefix shown in human-readable tables.
const TOKEN_DISPLAY_CHARS: usize = 16;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Lay out a table with aligned columns, header first.
///
/// Cells beyond the header count are ignored. With no rows only the header
/// line is produced.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(layout_row(headers.iter().copied(), &widths));
    for row in rows {
        lines.push(layout_row(row.iter().map(String::as_str), &widths));
    }
    lines
}

fn layout_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Print a table in human-readable format.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    for line in render_table(headers, rows) {
        println!("{line}");
    }
}

const HEADERS: [&str; 5] = ["TOKEN", "VALID", "USER", "SCOPES", "EXPIRES / REASON"];

/// One table row per outcome.
pub fn outcome_row(outcome: &Outcome) -> Vec<String> {
    let token = shorten(outcome.credential());
    match outcome.failure_reason() {
        None => {
            let user = outcome
                .identity()
                .map(|id| format!("{} ({})", id.name, id.id))
                .unwrap_or_default();
            let expires = outcome
                .expires_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            vec![
                token,
                "yes".to_string(),
                user,
                outcome.scopes().join(","),
                expires,
            ]
        }
        Some(reason) => vec![
            token,
            "no".to_string(),
            String::new(),
            String::new(),
            reason.to_string(),
        ],
    }
}

/// Print a single outcome.
pub fn print_outcome(outcome: &Outcome, format: OutputFormat) -> serde_json::Result<()> {
    match format {
        OutputFormat::Human => print_table(&HEADERS, &[outcome_row(outcome)]),
        OutputFormat::Json => println!("{}", serde_json::to_string(outcome)?),
    }
    Ok(())
}

/// Print a batch, followed by a summary line in human mode.
pub fn print_batch(result: &BatchResult, format: OutputFormat) -> serde_json::Result<()> {
    match format {
        OutputFormat::Human => {
            if result.is_empty() {
                println!("No tokens found in input");
            } else {
                let rows: Vec<Vec<String>> = result.iter().map(outcome_row).collect();
                print_table(&HEADERS, &rows);
                println!();
            }
            println!(
                "{} checked, {} valid, {} invalid",
                result.len(),
                result.valid_count(),
                result.invalid_count()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(result)?),
    }
    Ok(())
}

fn shorten(token: &str) -> String {
    if token.chars().count() <= TOKEN_DISPLAY_CHARS {
        return token.to_string();
    }
    let prefix: String = token.chars().take(TOKEN_DISPLAY_CHARS).collect();
    format!("{prefix}...")
}
