//! Shared XLSX models: formats, options, workbook, reports, errors.

use rust_xlsxwriter::XlsxError;
use tablekit_io_html::{
    EnumCellValue, HtmlTableError, SpecExtractOptions, SpecHtmlTable, SpecMergeRegion,
    SpecTableGrid,
};
use thiserror::Error;

use crate::conf::{EnumFmtKey, derive_default_xlsx_formats};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format description; `None` fields fall back to the writer default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from every non-merged cell (default).
    #[default]
    All,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Writer-wide options controlling formats, autofit and sheet naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Format for text cells.
    pub fmt_text: SpecCellFormat,
    /// Format for number cells.
    pub fmt_number: SpecCellFormat,
    /// Format for merged regions.
    pub fmt_merge: SpecCellFormat,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Replacement for characters Excel forbids in sheet names.
    pub sheet_name_replace_to: String,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        let derive_fmt = |key: EnumFmtKey| dict_fmt.get(&key).cloned().unwrap_or_default();
        Self {
            fmt_text: derive_fmt(EnumFmtKey::Text),
            fmt_number: derive_fmt(EnumFmtKey::Number),
            fmt_merge: derive_fmt(EnumFmtKey::Merge),
            policy_autofit: SpecAutofitCellsPolicy::default(),
            sheet_name_replace_to: "_".to_string(),
        }
    }
}

/// Options for the HTML-to-XLSX pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecConvertOptions {
    /// Grid extraction options.
    pub extract_options: SpecExtractOptions,
    /// Workbook write options.
    pub write_options: SpecXlsxWriteOptions,
    /// Maximum worker threads for table extraction; `None` picks a default.
    pub num_workers_max: Option<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookSpecification

/// One assembler input: the source table node and its extracted grid.
#[derive(Debug, Clone)]
pub struct SpecSheetInput<'a> {
    /// Source table (caption/id drive the sheet label).
    pub table: &'a SpecHtmlTable,
    /// Extracted grid and merges.
    pub grid: SpecTableGrid,
}

/// One named worksheet, immutable once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheet {
    /// Sheet label as assembled (not yet made Excel-legal).
    pub name: String,
    /// Rectangular grid.
    pub rows: Vec<Vec<EnumCellValue>>,
    /// Merge regions; `None` when the grid has none.
    pub merges: Option<Vec<SpecMergeRegion>>,
}

/// Ordered sheets; order becomes tab order in the output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWorkbook {
    /// Sheets in tab order.
    pub sheets: Vec<SpecSheet>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-sheet write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Label handed to the writer.
    pub sheet_label: String,
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Rows written.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Merge regions written.
    pub n_merges: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Result of one HTML-to-XLSX conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecConvertOutput {
    /// Workbook bytes (`.xlsx`).
    pub bytes: Vec<u8>,
    /// Per-sheet write reports in tab order.
    pub reports: Vec<SpecXlsxReport>,
    /// Extraction warnings, prefixed with the sheet label.
    pub warnings: Vec<String>,
    /// Parser recovery messages for malformed markup.
    pub parse_errors: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Conversion/write failures.
#[derive(Debug, Error)]
pub enum XlsxConvertError {
    /// Table selection or extraction failed.
    #[error(transparent)]
    Table(#[from] HtmlTableError),
    /// Serializer fault.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Grid does not fit one Excel worksheet.
    #[error(
        "Sheet {sheet_name:?} exceeds Excel limits: {n_rows} rows x {n_cols} columns \
         (max 1048576 x 16384)."
    )]
    ExcelLimit {
        /// Offending sheet label.
        sheet_name: String,
        /// Grid height.
        n_rows: usize,
        /// Grid width.
        n_cols: usize,
    },
    /// Writer already closed.
    #[error("Cannot write after close().")]
    WriterClosed,
    /// `close()` called on a buffer-only writer.
    #[error("No output file bound; use save_to_buffer().")]
    MissingFileOut,
    /// Invalid options.
    #[error("{0}")]
    InvalidOptions(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
