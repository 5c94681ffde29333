//! XLSX writer kernel that serializes assembled sheets into workbook output.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tablekit_io_html::{EnumCellValue, SpecMergeRegion};
use tracing::debug;

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{
    EnumAutofitColumnsRule, SpecAutofitCellsPolicy, SpecCellFormat, SpecSheet, SpecWorkbook,
    SpecXlsxReport, SpecXlsxWriteOptions, XlsxConvertError,
};
use crate::util::{create_sheet_identifier, estimate_width_len, sanitize_sheet_name};

/// Stateful workbook writer.
///
/// Sheets are buffered in memory; bytes are produced by
/// [`Self::save_to_buffer`] or flushed to the bound path by [`Self::close`].
pub struct XlsxWriter {
    path_file_out: Option<PathBuf>,
    workbook: Workbook,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create an in-memory writer.
    pub fn new(write_options: SpecXlsxWriteOptions) -> Self {
        Self {
            path_file_out: None,
            workbook: Workbook::new(),
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Create writer bound to an output path.
    pub fn with_file_out(path_file_out: PathBuf, write_options: SpecXlsxWriteOptions) -> Self {
        Self {
            path_file_out: Some(path_file_out),
            ..Self::new(write_options)
        }
    }

    /// Return output file path as string, if bound.
    pub fn file_out(&self) -> Option<String> {
        self.path_file_out
            .as_ref()
            .map(|path| path.to_string_lossy().to_string())
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Serialize the workbook into `.xlsx` bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, XlsxConvertError> {
        Ok(self.workbook.save_to_buffer()?)
    }

    /// Flush workbook to the bound path. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxConvertError> {
        if self.if_closed {
            return Ok(());
        }
        let Some(path_file_out) = &self.path_file_out else {
            return Err(XlsxConvertError::MissingFileOut);
        };
        self.workbook.save(path_file_out)?;
        self.if_closed = true;
        Ok(())
    }

    /// Write every sheet of an assembled workbook, in order.
    pub fn write_workbook(&mut self, workbook: &SpecWorkbook) -> Result<(), XlsxConvertError> {
        for sheet in &workbook.sheets {
            self.write_sheet(sheet)?;
        }
        Ok(())
    }

    /// Write one sheet: typed cells, merge regions, column widths.
    pub fn write_sheet(&mut self, sheet: &SpecSheet) -> Result<(), XlsxConvertError> {
        if self.if_closed {
            return Err(XlsxConvertError::WriterClosed);
        }
        let policy_autofit = self.write_options.policy_autofit.clone();
        validate_policy_autofit(&policy_autofit)?;

        let n_height = sheet.rows.len();
        let n_width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
        if n_height > N_NROWS_EXCEL_MAX || n_width > N_NCOLS_EXCEL_MAX {
            return Err(XlsxConvertError::ExcelLimit {
                sheet_name: sheet.name.clone(),
                n_rows: n_height,
                n_cols: n_width,
            });
        }

        let l_merges: &[SpecMergeRegion] = sheet.merges.as_deref().unwrap_or(&[]);
        let mut report = SpecXlsxReport {
            sheet_label: sheet.name.clone(),
            n_rows: n_height,
            n_cols: n_width,
            n_merges: l_merges.len(),
            ..Default::default()
        };

        let c_sheet_name = sanitize_sheet_name(&sheet.name, &self.write_options.sheet_name_replace_to);
        let c_sheet_name_unique = self.derive_unique_sheet_name(&c_sheet_name);
        if c_sheet_name_unique != sheet.name {
            report.warn(format!(
                "Sheet {:?} written as {c_sheet_name_unique:?}.",
                sheet.name
            ));
        }
        report.sheet_name = c_sheet_name_unique.clone();

        let fmt_text = derive_rust_xlsx_format(&self.write_options.fmt_text);
        let fmt_number = derive_rust_xlsx_format(&self.write_options.fmt_number);
        let fmt_merge = derive_rust_xlsx_format(&self.write_options.fmt_merge);

        let set_merge_origins: BTreeSet<(usize, usize)> = l_merges
            .iter()
            .map(|merge| (merge.row_idx_start, merge.col_idx_start))
            .collect();
        let set_merge_covered = derive_merge_covered_positions(l_merges);

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&c_sheet_name_unique)?;

        for merge in l_merges {
            worksheet.merge_range(
                cast_row_num(merge.row_idx_start)?,
                cast_col_num(merge.col_idx_start)?,
                cast_row_num(merge.row_idx_end)?,
                cast_col_num(merge.col_idx_end)?,
                "",
                &fmt_merge,
            )?;
        }

        let if_autofit_columns = !matches!(policy_autofit.rule_columns, EnumAutofitColumnsRule::None);
        let mut l_width_by_col = vec![0usize; n_width];

        for (n_idx_row, row_values) in sheet.rows.iter().enumerate() {
            for (n_idx_col, value) in row_values.iter().enumerate() {
                if set_merge_covered.contains(&(n_idx_row, n_idx_col)) {
                    continue;
                }

                let if_is_merge_origin = set_merge_origins.contains(&(n_idx_row, n_idx_col));
                let format = if if_is_merge_origin {
                    &fmt_merge
                } else if matches!(value, EnumCellValue::Number(_)) {
                    &fmt_number
                } else {
                    &fmt_text
                };
                write_cell_with_format(worksheet, n_idx_row, n_idx_col, value, format)?;

                if if_autofit_columns && !if_is_merge_origin {
                    l_width_by_col[n_idx_col] =
                        usize::max(l_width_by_col[n_idx_col], estimate_width_len(value));
                }
            }
        }

        if if_autofit_columns {
            let n_min = usize::max(1, policy_autofit.width_cell_min);
            let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));
            let n_pad = policy_autofit.width_cell_padding;

            for (n_idx_col, n_width_recorded) in l_width_by_col.iter().enumerate() {
                let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
                worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)?;
            }
        }

        debug!(
            sheet = %report.sheet_name,
            n_rows = report.n_rows,
            n_cols = report.n_cols,
            n_merges = report.n_merges,
            "wrote worksheet"
        );
        self.l_reports.push(report);
        Ok(())
    }

    /// Excel compares sheet names case-insensitively.
    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if self.set_sheet_names_existing.insert(name.to_lowercase()) {
            return name.to_string();
        }

        let mut n_idx = 2usize;
        loop {
            let candidate = create_sheet_identifier(name, n_idx);
            if self.set_sheet_names_existing.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Positions inside merge regions, excluding each region's origin.
fn derive_merge_covered_positions(merges: &[SpecMergeRegion]) -> BTreeSet<(usize, usize)> {
    let mut set_covered = BTreeSet::new();
    for merge in merges {
        for n_row in merge.row_idx_start..=merge.row_idx_end {
            for n_col in merge.col_idx_start..=merge.col_idx_end {
                if (n_row, n_col) != (merge.row_idx_start, merge.col_idx_start) {
                    set_covered.insert((n_row, n_col));
                }
            }
        }
    }
    set_covered
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), XlsxConvertError> {
    if policy_autofit.width_cell_min == 0 {
        return Err(XlsxConvertError::InvalidOptions(
            "policy_autofit.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(XlsxConvertError::InvalidOptions(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxConvertError> {
    match value {
        EnumCellValue::Empty => {}
        EnumCellValue::Text(val) => {
            worksheet.write_string_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                val,
                format,
            )?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                *val,
                format,
            )?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxConvertError> {
    u32::try_from(value)
        .map_err(|_| XlsxConvertError::InvalidOptions(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxConvertError> {
    u16::try_from(value)
        .map_err(|_| XlsxConvertError::InvalidOptions(format!("column index overflow: {value}")))
}
