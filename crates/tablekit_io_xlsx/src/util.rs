//! Stateless helper utilities used by the assembler and writer kernel.

use std::path::Path;

use chrono::{DateTime, Utc};
use tablekit_io_html::{EnumCellValue, SpecHtmlTable, normalize_whitespace};

use crate::conf::{
    C_FILE_EXT_XLSX, C_FILE_STEM_DEFAULT, C_SHEET_LABEL_PREFIX, C_SHEET_NAME_FALLBACK,
    N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL,
};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNaming

/// Sheet label for the table at `position` (0-based) of an assembled workbook.
///
/// Precedence: caption text (whitespace collapsed, first 31 chars), else
/// non-empty `id`, else `Table{position + 1}`. Labels are not de-duplicated
/// here.
pub fn derive_sheet_label(table: &SpecHtmlTable, position: usize) -> String {
    if let Some(c_caption) = table.caption.as_deref().map(normalize_whitespace)
        && !c_caption.is_empty()
    {
        return c_caption.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect();
    }
    if let Some(c_id) = table.id.as_deref()
        && !c_id.is_empty()
    {
        return c_id.to_string();
    }
    format!("{C_SHEET_LABEL_PREFIX}{}", position + 1)
}

/// Replace invalid and control chars, trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name
        .chars()
        .map(|chr| if chr.is_control() { ' ' } else { chr })
        .collect::<String>();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name
        .trim()
        .trim_matches('\'')
        .trim()
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect::<String>()
        .trim_end_matches('\'')
        .to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_FALLBACK.to_string();
    }
    c_name
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, n_idx_dup: usize) -> String {
    let c_sheet_name_suffix = format!("__{n_idx_dup}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimation

/// Estimate displayed width units for one cell value.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::Empty => 0,
        EnumCellValue::Text(val) => estimate_unicode_string_width(val),
        EnumCellValue::Number(_) => value.to_display_text().len(),
    }
}

/// ASCII counts 1, other characters 1.6 (rounded over the whole string).
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OutputNaming

/// Output file name: input stem + `.xlsx`, else a timestamped default.
///
/// The timestamp is `YYYY-MM-DDTHH-MM-SS` in UTC.
pub fn derive_output_file_name(path_file_in: Option<&Path>, now: DateTime<Utc>) -> String {
    if let Some(c_stem) = path_file_in
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy())
        && !c_stem.is_empty()
    {
        return format!("{c_stem}.{C_FILE_EXT_XLSX}");
    }
    format!(
        "{C_FILE_STEM_DEFAULT}_{}.{C_FILE_EXT_XLSX}",
        now.format("%Y-%m-%dT%H-%M-%S")
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

/// Worker count for parallel extraction: capped by CPUs, default at most 8.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(caption: Option<&str>, id: Option<&str>) -> SpecHtmlTable {
        SpecHtmlTable {
            caption: caption.map(ToString::to_string),
            id: id.map(ToString::to_string),
            rows: vec![],
        }
    }

    #[test]
    fn test_derive_sheet_label_precedence() {
        assert_eq!(derive_sheet_label(&table(Some("Sales"), Some("tbl1")), 0), "Sales");
        assert_eq!(derive_sheet_label(&table(None, Some("tbl1")), 0), "tbl1");
        assert_eq!(derive_sheet_label(&table(None, None), 2), "Table3");
        assert_eq!(derive_sheet_label(&table(Some(" \n "), None), 0), "Table1");
        assert_eq!(derive_sheet_label(&table(None, Some("")), 4), "Table5");
        assert_eq!(derive_sheet_label(&table(Some("Q\n  1"), None), 0), "Q 1");
    }

    #[test]
    fn test_derive_sheet_label_truncates_caption() {
        let c_caption = "Quarterly revenue by region and product line";
        let c_label = derive_sheet_label(&table(Some(c_caption), None), 0);
        assert_eq!(c_label.chars().count(), 31);
        assert_eq!(c_label, "Quarterly revenue by region and");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Q1/Q2 [draft]", "_"), "Q1_Q2 _draft_");
        assert_eq!(sanitize_sheet_name("'quoted'", "_"), "quoted");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name("a\tb\n", "_"), "a b");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_create_sheet_identifier() {
        assert_eq!(create_sheet_identifier("Sales", 2), "Sales__2");
        let c_name = create_sheet_identifier(&"y".repeat(31), 12);
        assert_eq!(c_name.chars().count(), 31);
        assert!(c_name.ends_with("__12"));
    }

    #[test]
    fn test_estimate_width_len() {
        assert_eq!(estimate_width_len(&EnumCellValue::Empty), 0);
        assert_eq!(estimate_width_len(&EnumCellValue::Number(1234.5)), 6);
        assert_eq!(estimate_width_len(&EnumCellValue::Number(1e-7)), 4);
        assert_eq!(
            estimate_width_len(&EnumCellValue::Text("ab汉字".to_string())),
            2 + 3
        );
    }

    #[test]
    fn test_calculate_worker_limit_bounds() {
        assert_eq!(calculate_worker_limit(Some(0)), 1);
        assert!(calculate_worker_limit(Some(usize::MAX)) >= 1);
        assert!((1..=8).contains(&calculate_worker_limit(None)));
    }

    #[test]
    fn test_derive_output_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            derive_output_file_name(Some(Path::new("/tmp/report.final.html")), now),
            "report.final.xlsx"
        );
        assert_eq!(
            derive_output_file_name(None, now),
            "converted_table_2024-03-09T14-05-07.xlsx"
        );
    }
}
