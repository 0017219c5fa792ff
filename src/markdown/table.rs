//! Pipe-table detection
//!
//! Tables are recognized line by line. Every consumer (extractor, renderer)
//! goes through these predicates so table numbering stays identical.

/// A line is part of a pipe table if, trimmed, it starts and ends with `|`
pub fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

/// Header/body separator such as `|---|:--:|`.
///
/// The interior may only hold `-`, `:`, whitespace and `|`, and must hold at
/// least one `-`.
pub fn is_separator_line(line: &str) -> bool {
    if !is_table_line(line) {
        return false;
    }
    let interior = strip_outer_pipes(line);
    interior.contains('-')
        && interior
            .chars()
            .all(|c| c == '-' || c == ':' || c == '|' || c.is_whitespace())
}

fn strip_outer_pipes(line: &str) -> &str {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    inner.strip_suffix('|').unwrap_or(inner)
}

/// Split a table line into raw cell texts (untrimmed).
///
/// An escaped pipe `\|` stays inside its cell, escape included.
pub fn split_cells(line: &str) -> Vec<String> {
    let interior = strip_outer_pipes(line);
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in interior.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                current.push(c);
                escaped = true;
            }
            '|' => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

/// Reassemble cells produced by [`split_cells`] into a table line
pub fn join_cells<S: AsRef<str>>(cells: &[S]) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push_str(cell.as_ref());
        line.push('|');
    }
    line
}

/// A pipe table as rendered into a worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownTable {
    /// 0-based, same numbering as the formula extractor
    pub index: usize,
    /// Text of the nearest preceding ATX heading
    pub caption: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    /// Widest row, header included
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }
}

fn heading_text(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn cell_text(raw: &str) -> String {
    raw.trim().replace("\\|", "|")
}

/// Collect every pipe table in the body, in document order.
///
/// The first non-separator row is the header; the rest are body rows.
pub fn parse_tables(body: &str) -> Vec<MarkdownTable> {
    let mut tables: Vec<MarkdownTable> = Vec::new();
    let mut caption: Option<String> = None;
    let mut in_table = false;

    for line in body.lines() {
        if !is_table_line(line) {
            in_table = false;
            if let Some(text) = heading_text(line) {
                caption = Some(text);
            }
            continue;
        }

        if !in_table {
            in_table = true;
            tables.push(MarkdownTable {
                index: tables.len(),
                caption: caption.clone(),
                header: Vec::new(),
                rows: Vec::new(),
            });
        }
        if is_separator_line(line) {
            continue;
        }

        let cells: Vec<String> = split_cells(line).iter().map(|c| cell_text(c)).collect();
        if let Some(table) = tables.last_mut() {
            if table.header.is_empty() && table.rows.is_empty() {
                table.header = cells;
            } else {
                table.rows.push(cells);
            }
        }
    }

    tables
}
