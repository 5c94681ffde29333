//! HTML-to-XLSX conversion pipeline: select, extract, assemble, serialize.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tablekit_io_html::{
    HtmlTableError, SpecExtractOptions, SpecExtractReport, SpecHtmlDocument, SpecHtmlTable,
    SpecTableGrid, extract_table_grid, select_tables, validate_extract_options,
};
use tracing::{debug, info};

use crate::assemble::assemble_workbook;
use crate::spec::{SpecConvertOptions, SpecConvertOutput, SpecSheetInput, XlsxConvertError};
use crate::util::{calculate_worker_limit, derive_sheet_label};
use crate::writer::XlsxWriter;

type ResExtract = Result<(SpecTableGrid, SpecExtractReport), HtmlTableError>;

/// Parse `html` and convert the selected tables (zero-based, in order) into
/// `.xlsx` bytes.
///
/// # Errors
/// - [`HtmlTableError::NoTablesFound`] when the markup has no `<table>`.
/// - [`HtmlTableError::EmptySelection`] / [`HtmlTableError::SelectionOutOfRange`]
///   for a bad selection.
/// - [`HtmlTableError::SpanOverflow`] under the reject rule.
/// - [`XlsxConvertError::ExcelLimit`] / [`XlsxConvertError::Xlsx`] from the writer.
pub fn convert_html_to_xlsx(
    html: &str,
    selection: &[usize],
    options: &SpecConvertOptions,
) -> Result<SpecConvertOutput, XlsxConvertError> {
    let document = SpecHtmlDocument::parse(html);
    convert_document_to_xlsx(&document, selection, options)
}

/// Convert every table of `html`, in document order.
pub fn convert_html_to_xlsx_all(
    html: &str,
    options: &SpecConvertOptions,
) -> Result<SpecConvertOutput, XlsxConvertError> {
    let document = SpecHtmlDocument::parse(html);
    let l_selection: Vec<usize> = (0..document.tables.len()).collect();
    convert_document_to_xlsx(&document, &l_selection, options)
}

/// Convert selected tables of an already parsed document.
pub fn convert_document_to_xlsx(
    document: &SpecHtmlDocument,
    selection: &[usize],
    options: &SpecConvertOptions,
) -> Result<SpecConvertOutput, XlsxConvertError> {
    let l_tables = select_tables(&document.tables, selection)?;
    validate_extract_options(&options.extract_options)?;
    info!(
        n_tables = document.tables.len(),
        n_selected = l_tables.len(),
        "converting tables"
    );

    let mut l_warnings = Vec::new();
    let l_extracted = extract_tables(
        &l_tables,
        &options.extract_options,
        options.num_workers_max,
        &mut l_warnings,
    );

    let mut l_inputs = Vec::with_capacity(l_tables.len());
    for (n_position, (table, res_extract)) in l_tables.iter().zip(l_extracted).enumerate() {
        let (grid, report) = res_extract?;
        let c_label = derive_sheet_label(table, n_position);
        l_warnings.extend(report.warnings.iter().map(|msg| format!("{c_label}: {msg}")));
        l_inputs.push(SpecSheetInput { table, grid });
    }

    let workbook = assemble_workbook(l_inputs);

    let mut writer = XlsxWriter::new(options.write_options.clone());
    writer.write_workbook(&workbook)?;
    let bytes = writer.save_to_buffer()?;
    debug!(n_bytes = bytes.len(), n_sheets = workbook.sheets.len(), "serialized workbook");

    Ok(SpecConvertOutput {
        bytes,
        reports: writer.report(),
        warnings: l_warnings,
        parse_errors: document.parse_errors.clone(),
    })
}

/// Extract grids in parallel; results keep the order of `tables`.
fn extract_tables(
    tables: &[&SpecHtmlTable],
    options: &SpecExtractOptions,
    num_workers_max: Option<usize>,
    warnings: &mut Vec<String>,
) -> Vec<ResExtract> {
    let extract_one = |table: &&SpecHtmlTable| -> ResExtract {
        let mut report = SpecExtractReport::default();
        let grid = extract_table_grid(table, options, &mut report)?;
        Ok((grid, report))
    };

    let n_workers_max = calculate_worker_limit(num_workers_max);
    if n_workers_max <= 1 || tables.len() <= 1 {
        return tables.iter().map(extract_one).collect();
    }

    let thread_pool = ThreadPoolBuilder::new().num_threads(n_workers_max).build();
    let Ok(thread_pool) = thread_pool else {
        warnings.push(format!(
            "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial extraction."
        ));
        return tables.iter().map(extract_one).collect();
    };

    thread_pool.install(|| tables.par_iter().map(extract_one).collect())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
    use pretty_assertions::assert_eq;
    use tablekit_io_html::EnumSpanOverflowRule;

    use super::*;

    const C_HTML_TWO_TABLES: &str = r#"<html><body>
<table>
  <caption>Sales</caption>
  <tr><th rowspan="2" colspan="2">Region</th><th>Q1</th></tr>
  <tr><th>units</th></tr>
  <tr><td>North</td><td>East</td><td>10</td></tr>
  <tr><td>South</td><td>West</td><td>20</td></tr>
  <tr><td>x</td><td>y</td><td>3.5</td></tr>
</table>
<table id="other"><tr><td>1</td></tr></table>
</body></html>"#;

    fn read_back(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
        open_workbook_from_rs(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_convert_selected_table_end_to_end() {
        let output =
            convert_html_to_xlsx(C_HTML_TWO_TABLES, &[0], &SpecConvertOptions::default()).unwrap();

        assert_eq!(output.reports.len(), 1);
        let report = &output.reports[0];
        assert_eq!(report.sheet_name, "Sales");
        assert_eq!(report.n_merges, 1);
        assert_eq!((report.n_rows, report.n_cols), (5, 3));
        assert!(output.warnings.is_empty());

        let mut workbook = read_back(output.bytes);
        assert_eq!(workbook.sheet_names(), vec!["Sales".to_string()]);
        let range = workbook.worksheet_range("Sales").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Region".to_string())));
        assert_eq!(range.get_value((0, 2)), Some(&Data::String("Q1".to_string())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::String("units".to_string())));
        assert_eq!(range.get_value((2, 2)), Some(&Data::Float(10.0)));
        assert_eq!(range.get_value((4, 2)), Some(&Data::Float(3.5)));
    }

    #[test]
    fn test_convert_header_merge_sets_first_row_width() {
        let c_html = r#"
<table>
  <tr><th colspan="2" rowspan="2">Header</th></tr>
  <tr></tr>
  <tr><td>1</td><td>2</td></tr>
  <tr><td>3</td><td>4</td></tr>
  <tr><td>5</td><td>6</td></tr>
</table>
<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>"#;

        let document = SpecHtmlDocument::parse(c_html);
        let mut report = SpecExtractReport::default();
        let grid = extract_table_grid(
            &document.tables[0],
            &SpecExtractOptions::default(),
            &mut report,
        )
        .unwrap();
        assert_eq!(grid.merges.len(), 1);
        assert_eq!(grid.rows[0].len(), grid.merges[0].col_idx_end + 1);

        let output = convert_document_to_xlsx(&document, &[0], &SpecConvertOptions::default())
            .unwrap();
        assert_eq!(output.reports.len(), 1);
        assert_eq!(output.reports[0].n_merges, 1);
        assert_eq!((output.reports[0].n_rows, output.reports[0].n_cols), (5, 2));
        assert_eq!(read_back(output.bytes).sheet_names(), vec!["Table1".to_string()]);
    }

    #[test]
    fn test_convert_malformed_markup_best_effort() {
        let c_html = r#"<!DOCTYPE html><html><body>
<table><caption>Broken</caption>
  <tr><td>1<td>2</tr>
  <tr><td>3</div></td></tr>
</table></span>
</body></html>"#;

        let output = convert_html_to_xlsx(c_html, &[0], &SpecConvertOptions::default()).unwrap();
        assert!(!output.parse_errors.is_empty());

        let mut workbook = read_back(output.bytes);
        let range = workbook.worksheet_range("Broken").unwrap();
        assert_eq!(range.get_value((0, 1)), Some(&Data::Float(2.0)));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(3.0)));
    }

    #[test]
    fn test_convert_fragment_reports_no_parse_errors() {
        let output = convert_html_to_xlsx(
            "<table><tr><td>1</td></tr></table>",
            &[0],
            &SpecConvertOptions::default(),
        )
        .unwrap();
        assert!(output.parse_errors.is_empty());
    }

    #[test]
    fn test_convert_all_tables_in_document_order() {
        let output =
            convert_html_to_xlsx_all(C_HTML_TWO_TABLES, &SpecConvertOptions::default()).unwrap();
        let l_names: Vec<_> = output.reports.iter().map(|r| r.sheet_name.as_str()).collect();
        assert_eq!(l_names, vec!["Sales", "other"]);
    }

    #[test]
    fn test_convert_selection_order_and_duplicates() {
        let options = SpecConvertOptions {
            num_workers_max: Some(1),
            ..Default::default()
        };
        let output = convert_html_to_xlsx(C_HTML_TWO_TABLES, &[1, 0, 1], &options).unwrap();
        let l_names: Vec<_> = output.reports.iter().map(|r| r.sheet_name.as_str()).collect();
        assert_eq!(l_names, vec!["other", "Sales", "other__2"]);
    }

    #[test]
    fn test_convert_selection_errors() {
        let options = SpecConvertOptions::default();
        assert!(matches!(
            convert_html_to_xlsx("<p>nothing here</p>", &[0], &options),
            Err(XlsxConvertError::Table(HtmlTableError::NoTablesFound))
        ));
        assert!(matches!(
            convert_html_to_xlsx(C_HTML_TWO_TABLES, &[], &options),
            Err(XlsxConvertError::Table(HtmlTableError::EmptySelection))
        ));
        assert!(matches!(
            convert_html_to_xlsx(C_HTML_TWO_TABLES, &[5], &options),
            Err(XlsxConvertError::Table(HtmlTableError::SelectionOutOfRange {
                index: 5,
                count: 2
            }))
        ));
    }

    #[test]
    fn test_convert_span_overflow_clamp_and_reject() {
        let c_html = r#"<table><tr><td colspan="5">wide</td></tr></table>"#;
        let mut options = SpecConvertOptions::default();
        options.extract_options.span_max = 3;

        let output = convert_html_to_xlsx(c_html, &[0], &options).unwrap();
        assert_eq!(output.reports[0].n_cols, 3);
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].starts_with("Table1: "));

        options.extract_options.rule_span_overflow = EnumSpanOverflowRule::Reject;
        assert!(matches!(
            convert_html_to_xlsx(c_html, &[0], &options),
            Err(XlsxConvertError::Table(HtmlTableError::SpanOverflow { span: 5, .. }))
        ));
    }

    #[test]
    fn test_convert_parallel_matches_serial() {
        let c_html: String = (0..12)
            .map(|n| format!(r#"<table><tr><td rowspan="2">{n}</td><td>a</td></tr><tr><td>b</td></tr></table>"#))
            .collect();
        let l_selection: Vec<usize> = (0..12).collect();

        let output_serial = convert_html_to_xlsx(
            &c_html,
            &l_selection,
            &SpecConvertOptions {
                num_workers_max: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        let output_parallel = convert_html_to_xlsx(
            &c_html,
            &l_selection,
            &SpecConvertOptions {
                num_workers_max: Some(4),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(output_serial.reports, output_parallel.reports);
        assert_eq!(output_parallel.reports[11].sheet_name, "Table12");
    }
}
