//! Stateless helpers for cell values, span attributes and table selection.

use crate::conf::{C_TABLE_LABEL_PREFIX, N_SPAN_DEFAULT};
use crate::spec::{EnumCellValue, HtmlTableError, SpecHtmlTable, SpecTableSummary};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Collapse whitespace runs (Unicode-aware, incl. NBSP) to one space and trim.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical text of a number, in the shape a browser's `Number#toString`
/// produces: shortest round-trip digits, positional when the decimal exponent
/// lies in `[-6, 21)`, else `d[.ddd]e±x` (`1e-7`, `1.5e+21`).
pub fn format_number_canonical(n_value: f64) -> String {
    if n_value == 0.0 {
        return "0".to_string();
    }
    if !n_value.is_finite() {
        return n_value.to_string();
    }

    let c_sign = if n_value < 0.0 { "-" } else { "" };
    let c_sci = format!("{:e}", n_value.abs());
    let Some((c_mantissa, c_exponent)) = c_sci.split_once('e') else {
        return n_value.to_string();
    };
    let Ok(n_exp) = c_exponent.parse::<i32>() else {
        return n_value.to_string();
    };

    let c_digits: String = c_mantissa.chars().filter(|chr| *chr != '.').collect();
    let n_digits = c_digits.len() as i32;
    let n_point = n_exp + 1;

    let c_body = if n_digits <= n_point && n_point <= 21 {
        format!("{c_digits}{}", "0".repeat((n_point - n_digits) as usize))
    } else if 0 < n_point && n_point <= 21 {
        let (c_int, c_frac) = c_digits.split_at(n_point as usize);
        format!("{c_int}.{c_frac}")
    } else if -6 < n_point && n_point <= 0 {
        format!("0.{}{c_digits}", "0".repeat(n_point.unsigned_abs() as usize))
    } else {
        let (c_lead, c_rest) = c_digits.split_at(1);
        let c_exp_sign = if n_exp < 0 { '-' } else { '+' };
        if c_rest.is_empty() {
            format!("{c_lead}e{c_exp_sign}{}", n_exp.unsigned_abs())
        } else {
            format!("{c_lead}.{c_rest}e{c_exp_sign}{}", n_exp.unsigned_abs())
        }
    };
    format!("{c_sign}{c_body}")
}

/// Convert raw cell text into a typed value.
///
/// Text becomes [`EnumCellValue::Number`] only when the normalized string is
/// reproduced exactly by [`format_number_canonical`], so `"42"` and `"1e-7"`
/// are numeric while `"42.0"`, `"007"`, `"1e3"` and `"1,000"` stay text.
pub fn parse_cell_value(raw: &str) -> EnumCellValue {
    let c_text = normalize_whitespace(raw);
    if c_text.is_empty() {
        return EnumCellValue::Empty;
    }

    if let Ok(n_value) = c_text.parse::<f64>()
        && n_value.is_finite()
        && !(n_value == 0.0 && n_value.is_sign_negative())
        && format_number_canonical(n_value) == c_text
    {
        return EnumCellValue::Number(n_value);
    }

    EnumCellValue::Text(c_text)
}

/// Parse a raw `colspan`/`rowspan` attribute.
///
/// Leading whitespace and an optional `+` are skipped, then leading ASCII
/// digits are read and anything after them ignored. Absent, non-numeric,
/// zero or negative values yield 1. Digit overflow saturates so the caller's
/// span cap still applies.
pub fn parse_span(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return N_SPAN_DEFAULT;
    };
    let c_trimmed = raw.trim_start();
    let c_digits = c_trimmed.strip_prefix('+').unwrap_or(c_trimmed);

    let mut n_span = 0usize;
    let mut if_has_digit = false;
    for chr in c_digits.chars() {
        let Some(n_digit) = chr.to_digit(10) else {
            break;
        };
        if_has_digit = true;
        n_span = n_span.saturating_mul(10).saturating_add(n_digit as usize);
    }

    if !if_has_digit || n_span == 0 {
        N_SPAN_DEFAULT
    } else {
        n_span
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableSelection

/// Human-readable label for a table: caption, else id, else `Table N`.
pub fn derive_table_label(table: &SpecHtmlTable, table_idx: usize) -> String {
    if let Some(c_caption) = table.caption.as_deref().map(normalize_whitespace)
        && !c_caption.is_empty()
    {
        return c_caption;
    }
    if let Some(c_id) = table.id.as_deref().map(str::trim)
        && !c_id.is_empty()
    {
        return c_id.to_string();
    }
    format!("{C_TABLE_LABEL_PREFIX} {}", table_idx + 1)
}

/// Listing entries for every table.
pub fn describe_tables(tables: &[SpecHtmlTable]) -> Vec<SpecTableSummary> {
    tables
        .iter()
        .enumerate()
        .map(|(n_idx, table)| SpecTableSummary {
            index: n_idx,
            label: derive_table_label(table, n_idx),
            n_rows: table.rows.len(),
        })
        .collect()
}

/// Resolve a caller selection (zero-based indices) against detected tables.
///
/// Order and duplicates of `selection` are preserved.
pub fn select_tables<'a>(
    tables: &'a [SpecHtmlTable],
    selection: &[usize],
) -> Result<Vec<&'a SpecHtmlTable>, HtmlTableError> {
    if tables.is_empty() {
        return Err(HtmlTableError::NoTablesFound);
    }
    if selection.is_empty() {
        return Err(HtmlTableError::EmptySelection);
    }

    selection
        .iter()
        .map(|n_idx| {
            tables
                .get(*n_idx)
                .ok_or(HtmlTableError::SelectionOutOfRange {
                    index: *n_idx,
                    count: tables.len(),
                })
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_cell_value_numeric_round_trip() {
        assert_eq!(parse_cell_value("42"), EnumCellValue::Number(42.0));
        assert_eq!(
            parse_cell_value("42.0"),
            EnumCellValue::Text("42.0".to_string())
        );
        assert_eq!(parse_cell_value("  7 "), EnumCellValue::Number(7.0));
        assert_eq!(parse_cell_value("-3.25"), EnumCellValue::Number(-3.25));
        assert_eq!(parse_cell_value("abc"), EnumCellValue::Text("abc".to_string()));
    }

    #[test]
    fn test_parse_cell_value_rejects_non_canonical_numbers() {
        for c_raw in ["007", "1,000", "1e3", "+5", ".5", "12abc", "-0", "inf", "NaN"] {
            assert_eq!(
                parse_cell_value(c_raw),
                EnumCellValue::Text(c_raw.to_string()),
                "{c_raw:?}"
            );
        }
    }

    #[test]
    fn test_parse_cell_value_exponent_range() {
        assert_eq!(parse_cell_value("1e-7"), EnumCellValue::Number(1e-7));
        assert_eq!(parse_cell_value("1e+21"), EnumCellValue::Number(1e21));
        assert_eq!(parse_cell_value("1.5e+22"), EnumCellValue::Number(1.5e22));
        assert_eq!(parse_cell_value("0.000001"), EnumCellValue::Number(1e-6));
        assert_eq!(
            parse_cell_value("100000000000000000000"),
            EnumCellValue::Number(1e20)
        );
        for c_raw in ["0.0000001", "100000000000000000000000", "1e21", "1E-7", "1e-07"] {
            assert_eq!(
                parse_cell_value(c_raw),
                EnumCellValue::Text(c_raw.to_string()),
                "{c_raw:?}"
            );
        }
    }

    #[test]
    fn test_format_number_canonical() {
        assert_eq!(format_number_canonical(0.0), "0");
        assert_eq!(format_number_canonical(42.0), "42");
        assert_eq!(format_number_canonical(-3.25), "-3.25");
        assert_eq!(format_number_canonical(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number_canonical(123456.789), "123456.789");
        assert_eq!(format_number_canonical(0.000123), "0.000123");
        assert_eq!(format_number_canonical(1.25e-7), "1.25e-7");
        assert_eq!(format_number_canonical(-2e21), "-2e+21");
        assert_eq!(format_number_canonical(1e20), "100000000000000000000");
    }

    #[test]
    fn test_parse_cell_value_empty_and_whitespace() {
        assert_eq!(parse_cell_value(""), EnumCellValue::Empty);
        assert_eq!(parse_cell_value(" \n\t "), EnumCellValue::Empty);
        assert_eq!(parse_cell_value("\u{a0}"), EnumCellValue::Empty);
        assert_eq!(
            parse_cell_value(" Net \n  income\t"),
            EnumCellValue::Text("Net income".to_string())
        );
    }

    #[test]
    fn test_parse_span() {
        assert_eq!(parse_span(None), 1);
        assert_eq!(parse_span(Some("3")), 3);
        assert_eq!(parse_span(Some(" 2 ")), 2);
        assert_eq!(parse_span(Some("+4")), 4);
        assert_eq!(parse_span(Some("2abc")), 2);
        assert_eq!(parse_span(Some("abc")), 1);
        assert_eq!(parse_span(Some("")), 1);
        assert_eq!(parse_span(Some("0")), 1);
        assert_eq!(parse_span(Some("-2")), 1);
        assert_eq!(parse_span(Some("99999999999999999999999")), usize::MAX);
    }

    #[test]
    fn test_derive_table_label_precedence() {
        let table = SpecHtmlTable {
            caption: Some("  Sales \n".to_string()),
            id: Some("tbl1".to_string()),
            rows: vec![],
        };
        assert_eq!(derive_table_label(&table, 0), "Sales");

        let table = SpecHtmlTable {
            caption: Some("   ".to_string()),
            id: Some("tbl1".to_string()),
            rows: vec![],
        };
        assert_eq!(derive_table_label(&table, 0), "tbl1");

        assert_eq!(derive_table_label(&SpecHtmlTable::default(), 2), "Table 3");
    }

    #[test]
    fn test_select_tables() {
        let l_tables = vec![
            SpecHtmlTable {
                id: Some("a".to_string()),
                ..Default::default()
            },
            SpecHtmlTable {
                id: Some("b".to_string()),
                ..Default::default()
            },
        ];

        let l_selected = select_tables(&l_tables, &[1, 0, 1]).unwrap();
        let l_ids: Vec<_> = l_selected.iter().map(|t| t.id.as_deref()).collect();
        assert_eq!(l_ids, vec![Some("b"), Some("a"), Some("b")]);

        assert_eq!(
            select_tables(&l_tables, &[]).unwrap_err(),
            HtmlTableError::EmptySelection
        );
        assert_eq!(
            select_tables(&l_tables, &[2]).unwrap_err(),
            HtmlTableError::SelectionOutOfRange { index: 2, count: 2 }
        );
        assert_eq!(
            select_tables(&[], &[0]).unwrap_err(),
            HtmlTableError::NoTablesFound
        );
    }
}
