//! Output formatting utilities.

use serde::Serialize;

/// Formats a value as pretty JSON.
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// A table column: heading and width.
pub type Column = (&'static str, usize);

/// Prints a table header and rule.
pub fn print_table_header(columns: &[Column]) {
    let cells: Vec<String> = columns.iter().map(|(title, _)| title.to_string()).collect();
    println!("{}", format_table_row(columns, &cells));
    let width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    println!("{}", "-".repeat(width.max(20)));
}

/// Formats one row; the last cell is never padded or truncated.
pub fn format_table_row(columns: &[Column], cells: &[String]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| match columns.get(i) {
            Some((_, width)) if i < last => format!("{:<width$}", truncate(cell, *width), width = *width),
            _ => cell.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `...`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("MunitionDetonation", 10), "Munitio...");
        assert_eq!(truncate("Fire", 10), "Fire");
    }

    #[test]
    fn test_row_pads_all_but_last_cell() {
        let columns = [("A", 4), ("B", 3)];
        let row = format_table_row(&columns, &["x".to_string(), "long tail".to_string()]);
        assert_eq!(row, "x    long tail");
    }
}
