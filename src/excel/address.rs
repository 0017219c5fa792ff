//! A1-style addressing and worksheet naming rules

/// Excel's worksheet name limit
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Convert a 0-based column index to an Excel column letter
///
/// Examples:
/// - 0 → A
/// - 25 → Z
/// - 26 → AA
pub fn column_index_to_letter(index: usize) -> String {
    let mut result = String::new();
    let mut idx = index;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// A1 address for a 0-based (row, column) pair
pub fn cell_address(row: u32, col: u16) -> String {
    format!("{}{}", column_index_to_letter(col as usize), row + 1)
}

/// Make a worksheet name Excel accepts.
///
/// Drops `[ ] : * ? / \`, trims surrounding apostrophes and whitespace, and
/// truncates to 31 characters. Returns `None` if nothing usable is left.
pub fn sanitize_sheet_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.chars().take(MAX_SHEET_NAME_LEN).collect())
}

/// Pick a name not yet in `taken` (case-insensitive), appending ` (n)`
pub fn unique_sheet_name(base: &str, taken: &[String]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|t| t.eq_ignore_ascii_case(candidate));
    if !is_taken(base) {
        return base.to_string();
    }

    let mut n = 2;
    loop {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        let candidate: String = base.chars().take(keep).collect::<String>() + &suffix;
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_to_letter() {
        assert_eq!(column_index_to_letter(0), "A");
        assert_eq!(column_index_to_letter(1), "B");
        assert_eq!(column_index_to_letter(25), "Z");
        assert_eq!(column_index_to_letter(26), "AA");
        assert_eq!(column_index_to_letter(27), "AB");
        assert_eq!(column_index_to_letter(701), "ZZ");
    }

    #[test]
    fn test_cell_address() {
        assert_eq!(cell_address(0, 0), "A1");
        assert_eq!(cell_address(1, 2), "C2");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Q1: Sales/Costs"), Some("Q1 SalesCosts".to_string()));
        assert_eq!(sanitize_sheet_name(" 'Budget' "), Some("Budget".to_string()));
        assert_eq!(sanitize_sheet_name("[]*?"), None);
        let long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).map(|s| s.len()), Some(31));
    }

    #[test]
    fn test_unique_sheet_name() {
        let taken = vec!["Sales".to_string(), "sales (2)".to_string()];
        assert_eq!(unique_sheet_name("Costs", &taken), "Costs");
        assert_eq!(unique_sheet_name("Sales", &taken), "Sales (3)");
    }
}
