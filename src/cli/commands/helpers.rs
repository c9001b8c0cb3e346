//! Shared helper functions for command execution.

use crate::packager::{EntryKind, ReleaseReport};

/// Prompt user for confirmation with y/n input
pub(super) fn prompt_confirmation(prompt: &str) -> std::io::Result<bool> {
    use std::io::Write;

    print!("{prompt} [y/N]: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(matches!(response.as_str(), "y" | "yes"))
}

/// Format a byte count for humans
pub(super) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// One line per package entry, for the summary after packaging
pub(super) fn report_lines(report: &ReleaseReport) -> Vec<String> {
    report
        .entries
        .iter()
        .map(|entry| {
            let name = match entry.kind {
                EntryKind::Dir => format!("{}/", entry.name),
                EntryKind::File | EntryKind::Symlink => entry.name.clone(),
            };
            let mut line = match entry.kind {
                EntryKind::Dir => format!(
                    "{name:<16} {:>10}  ({} file{})",
                    format_size(entry.size),
                    entry.files,
                    if entry.files == 1 { "" } else { "s" }
                ),
                _ => format!("{name:<16} {:>10}", format_size(entry.size)),
            };
            if let Some(sha) = &entry.sha256 {
                line.push_str(&format!("  sha256:{sha}"));
            }
            line
        })
        .collect()
}
