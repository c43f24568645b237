//! Markdown table extraction.
//!
//! Parses the pipe-delimited table text found inside a fenced block into
//! ordered rows keyed by header cell. Malformed rows are reconciled
//! against the header, never rejected.

use indexmap::IndexMap;

/// One data row, keyed by header cell in column order.
pub type Row = IndexMap<String, String>;

/// Parse a Markdown table body into rows.
///
/// The first non-empty line is the header, the second is the separator
/// (discarded without validation), the rest are data rows. Rows shorter
/// than the header are padded with empty cells; longer rows are
/// truncated. Fewer than two non-empty lines yields no rows.
pub fn parse_table(text: &str) -> Vec<Row> {
    let lines: Vec<&str> = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers = split_cells(lines[0]);
    let mut rows = Vec::new();
    for line in &lines[2..] {
        let mut cells = split_cells(line);
        cells.resize(headers.len(), String::new());
        rows.push(headers.iter().cloned().zip(cells).collect());
    }
    rows
}

fn split_cells(line: &str) -> Vec<String> {
    line.trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_header_and_rows_in_order() {
        let rows = parse_table("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], "2");
        assert_eq!(rows[1]["a"], "3");
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn reconciles_short_and_long_rows_against_header() {
        let rows = parse_table(
            "| a | b | c | d |\n|---|---|---|---|\n| 1 | 2 |\n| 1 | 2 | 3 | 4 |\n| 1 | 2 | 3 | 4 | 5 | 6 |",
        );
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.len(), 4);
        }
        assert_eq!(rows[0]["c"], "");
        assert_eq!(rows[0]["d"], "");
        assert_eq!(rows[2]["d"], "4");
    }

    #[test]
    fn fewer_than_two_lines_is_empty() {
        assert!(parse_table("").is_empty());
        assert!(parse_table("| only | header |").is_empty());
        assert!(parse_table("\n\n  \n").is_empty());
    }

    #[test]
    fn separator_row_is_discarded_unvalidated() {
        let rows = parse_table("| a |\nnot a separator at all\n| 1 |");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["a"], "1");
    }

    #[test]
    fn blank_interior_lines_are_skipped() {
        let rows = parse_table("| a | b |\n\n|---|---|\n\n| 1 | 2 |");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["b"], "2");
    }
}
