//! Syntax-only formula checks
//!
//! Nothing is evaluated. Unknown function names are advisory and never make a
//! formula invalid.

use crate::error::ConvertResult;
use crate::types::FormulaValidation;
use regex::Regex;

/// Spreadsheet functions the validator recognizes without warning
const KNOWN_FUNCTIONS: &[&str] = &[
    // Math & aggregation
    "SUM", "SUMIF", "SUMIFS", "SUMPRODUCT", "AVERAGE", "AVERAGEIF", "AVERAGEIFS", "AVG",
    "COUNT", "COUNTA", "COUNTBLANK", "COUNTIF", "COUNTIFS", "MAX", "MAXIFS", "MIN",
    "MINIFS", "MEDIAN", "MODE", "STDEV", "STDEVP", "VAR", "VARP", "PRODUCT", "ROUND",
    "ROUNDUP", "ROUNDDOWN", "CEILING", "FLOOR", "INT", "TRUNC", "ABS", "SQRT", "POWER",
    "MOD", "EXP", "LN", "LOG", "LOG10", "PI", "RAND", "RANDBETWEEN", "SIGN", "SUBTOTAL",
    "LARGE", "SMALL", "RANK",
    // Logic
    "IF", "IFS", "IFERROR", "IFNA", "AND", "OR", "NOT", "XOR", "TRUE", "FALSE", "SWITCH",
    // Lookup
    "VLOOKUP", "HLOOKUP", "XLOOKUP", "LOOKUP", "INDEX", "MATCH", "XMATCH", "CHOOSE",
    "OFFSET", "INDIRECT", "ROW", "ROWS", "COLUMN", "COLUMNS", "FILTER", "SORT", "UNIQUE",
    // Text
    "CONCAT", "CONCATENATE", "TEXTJOIN", "LEFT", "RIGHT", "MID", "LEN", "LOWER", "UPPER",
    "PROPER", "TRIM", "SUBSTITUTE", "REPLACE", "FIND", "SEARCH", "TEXT", "VALUE", "REPT",
    "EXACT",
    // Date & time
    "TODAY", "NOW", "DATE", "TIME", "YEAR", "MONTH", "DAY", "HOUR", "MINUTE", "SECOND",
    "WEEKDAY", "WEEKNUM", "DATEDIF", "DATEVALUE", "EDATE", "EOMONTH", "NETWORKDAYS",
    "WORKDAY", "YEARFRAC", "DAYS",
    // Financial
    "PMT", "PV", "FV", "NPV", "XNPV", "IRR", "XIRR", "RATE", "NPER", "IPMT", "PPMT",
    // Information
    "ISBLANK", "ISERROR", "ISNUMBER", "ISTEXT", "ISNA", "NA",
];

/// Lightweight formula syntax checker
#[derive(Debug, Clone)]
pub struct FormulaValidator {
    function_re: Regex,
}

impl FormulaValidator {
    pub fn new() -> ConvertResult<Self> {
        Ok(Self {
            function_re: Regex::new(r"([A-Za-z_][A-Za-z0-9_.]*)\(")?,
        })
    }

    /// Check a formula body (the text between `{=` and `}`)
    pub fn validate(&self, formula: &str) -> FormulaValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if formula.trim().is_empty() {
            errors.push("Empty formula".to_string());
        }

        if !parentheses_balanced(formula) {
            errors.push("Mismatched parentheses".to_string());
        }

        for name in self.function_names(formula) {
            if !is_known_function(&name) {
                let warning = format!("Unknown function: {}", name);
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }

        FormulaValidation {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Bare words immediately followed by `(`
    pub fn function_names(&self, formula: &str) -> Vec<String> {
        self.function_re
            .captures_iter(formula)
            .filter_map(|caps| caps.get(1))
            .filter(|m| {
                // Skip tokens that continue an identifier or cell reference
                formula[..m.start()]
                    .chars()
                    .next_back()
                    .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_' && c != '.')
            })
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Case-insensitive whitelist lookup; `_xlfn.` prefixes are ignored
pub fn is_known_function(name: &str) -> bool {
    let upper = name.to_uppercase();
    let bare = upper.strip_prefix("_XLFN.").unwrap_or(&upper);
    KNOWN_FUNCTIONS.contains(&bare)
}

/// Count `(` against `)` outside of double-quoted string literals
fn parentheses_balanced(formula: &str) -> bool {
    let mut open = 0i64;
    let mut close = 0i64;
    let mut in_string = false;

    for c in formula.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => open += 1,
            ')' if !in_string => close += 1,
            _ => {}
        }
    }

    open == close
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> FormulaValidator {
        FormulaValidator::new().unwrap()
    }

    #[test]
    fn test_valid_formula() {
        let result = validator().validate("SUM(B2:B5)");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_mismatched_parentheses() {
        let result = validator().validate("SUM(B2:B3");
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Mismatched parentheses"]);
    }

    #[test]
    fn test_parentheses_in_strings_are_ignored() {
        let result = validator().validate(r#"IF(A1="(",1,0)"#);
        assert!(result.is_valid);
    }

    #[test]
    fn test_empty_formula() {
        let result = validator().validate("   ");
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Empty formula"]);
    }

    #[test]
    fn test_unknown_function_is_only_a_warning() {
        let result = validator().validate("FROBNICATE(A1) + FROBNICATE(A2)");
        assert!(result.is_valid);
        assert_eq!(result.warnings, vec!["Unknown function: FROBNICATE"]);
    }

    #[test]
    fn test_function_names_case_insensitive() {
        let result = validator().validate("sum(a1:a3)*round(b1,2)");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_function_names_extraction() {
        let names = validator().function_names("IF(ISBLANK(A1), 0, _xlfn.XLOOKUP(B1, C:C, D:D))");
        assert_eq!(names, vec!["IF", "ISBLANK", "_xlfn.XLOOKUP"]);
        assert!(is_known_function("_xlfn.XLOOKUP"));
    }

    #[test]
    fn test_plain_arithmetic() {
        let result = validator().validate("A1*2+(B1-C1)");
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }
}
