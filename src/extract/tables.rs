//! Table detection over layout-preserving page text.
//!
//! `pdftotext -layout` keeps column positions, so table cells end up separated
//! by runs of spaces. A table is a run of consecutive lines that each split
//! into at least two cells, where most rows agree on the number of cells.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Two or more whitespace characters separate cells.
static CELL_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Minimum number of rows (header included) for a run to count as a table.
const MIN_ROWS: usize = 2;

/// A table detected on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of columns (header width).
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Render as the markdown block stored in the index.
    pub fn to_markdown(&self, table_number: u32, page: u32) -> String {
        let mut md = format!("Table {} (Page {}):\n\n", table_number, page);
        md.push_str(&self.header.join(" | "));
        md.push('\n');
        md.push_str(&vec!["---"; self.width()].join(" | "));
        md.push('\n');
        for row in &self.rows {
            md.push_str(&row.join(" | "));
            md.push('\n');
        }
        md
    }

    fn from_run(run: &[Vec<String>]) -> Option<Self> {
        if run.len() < MIN_ROWS {
            return None;
        }

        // Most rows must agree on a cell count, otherwise this is prose that
        // happens to contain double spaces.
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for row in run {
            *counts.entry(row.len()).or_default() += 1;
        }
        let modal = counts.values().copied().max().unwrap_or(0);
        if modal * 2 < run.len() {
            return None;
        }

        let width = run.iter().map(Vec::len).max().unwrap_or(0);
        let pad = |row: &Vec<String>| {
            let mut row = row.clone();
            row.resize(width, String::new());
            row
        };

        Some(Self {
            header: pad(&run[0]),
            rows: run[1..].iter().map(pad).collect(),
        })
    }
}

fn split_cells(line: &str) -> Vec<String> {
    CELL_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Detect tables in layout-preserving text of a single page.
///
/// One blank line inside a run is tolerated, since pdftotext often emits
/// blank lines between table rows.
pub fn detect_tables(layout_text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();
    let mut blank_lines = 0;

    let mut flush = |run: &mut Vec<Vec<String>>| {
        if let Some(table) = Table::from_run(run) {
            tables.push(table);
        }
        run.clear();
    };

    for line in layout_text.lines() {
        if line.trim().is_empty() {
            blank_lines += 1;
            if blank_lines > 1 {
                flush(&mut run);
            }
            continue;
        }
        blank_lines = 0;

        let cells = split_cells(line);
        if cells.len() >= 2 {
            run.push(cells);
        } else {
            flush(&mut run);
        }
    }
    flush(&mut run);

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "\
Annual Report 2023

The following table summarises spending by department.

Department        Budget      Actual
Health            12.5        11.9
Education         8.0         8.4
Transport         4.2

Spending rose overall compared to the prior year.
";

    #[test]
    fn test_detects_single_table() {
        let tables = detect_tables(PAGE);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.header, vec!["Department", "Budget", "Actual"]);
        assert_eq!(table.rows.len(), 3);
        // Short rows are padded to the table width.
        assert_eq!(table.rows[2], vec!["Transport", "4.2", ""]);
    }

    #[test]
    fn test_markdown_rendering() {
        let table = &detect_tables(PAGE)[0];
        let md = table.to_markdown(1, 5);
        let expected = "\
Table 1 (Page 5):

Department | Budget | Actual
--- | --- | ---
Health | 12.5 | 11.9
Education | 8.0 | 8.4
Transport | 4.2 | 
";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_single_blank_line_between_rows_is_tolerated() {
        let text = "Name    Value\n\nAlpha   1\n\nBeta    2\n";
        let tables = detect_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn test_two_blank_lines_split_tables() {
        let text = "A    B\n1    2\n\n\nC    D\n3    4\n";
        let tables = detect_tables(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].header, vec!["C", "D"]);
    }

    #[test]
    fn test_prose_is_not_a_table() {
        let text = "This sentence has  a double space.\nAnd a single line follows here.\n";
        assert!(detect_tables(text).is_empty());
    }

    #[test]
    fn test_inconsistent_rows_are_rejected() {
        let text = "a  b\nc  d  e  f\ng  h  i\nj  k  l  m  n\n";
        assert!(detect_tables(text).is_empty());
    }
}
