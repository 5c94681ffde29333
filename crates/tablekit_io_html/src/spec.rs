//! HTML table models, extraction options, reports and error types.

use thiserror::Error;

use crate::conf::N_SPAN_MAX_DEFAULT;
use crate::util::format_number_canonical;

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Typed value of one grid position.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// No content, or a placeholder covered by a span.
    #[default]
    Empty,
    /// Text value (whitespace-normalized).
    Text(String),
    /// Numeric value whose text round-trips exactly.
    Number(f64),
}

impl EnumCellValue {
    /// Whether this value is [`EnumCellValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Display text as it would appear in a spreadsheet cell.
    pub fn to_display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(val) => val.clone(),
            Self::Number(val) => format_number_canonical(*val),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HtmlNodes

/// One `<th>`/`<td>` cell as read from the parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecHtmlCell {
    /// Concatenated descendant text, entity-decoded, not yet normalized.
    pub text: String,
    /// Raw `colspan` attribute value.
    pub colspan: Option<String>,
    /// Raw `rowspan` attribute value.
    pub rowspan: Option<String>,
}

impl SpecHtmlCell {
    /// Plain cell without span attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            colspan: None,
            rowspan: None,
        }
    }

    /// Return a copy with the given `colspan` attribute.
    pub fn with_colspan(mut self, value: impl Into<String>) -> Self {
        self.colspan = Some(value.into());
        self
    }

    /// Return a copy with the given `rowspan` attribute.
    pub fn with_rowspan(mut self, value: impl Into<String>) -> Self {
        self.rowspan = Some(value.into());
        self
    }
}

/// One `<tr>` with its cells in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecHtmlRow {
    /// Header and data cells in the order they appear.
    pub cells: Vec<SpecHtmlCell>,
}

impl From<Vec<SpecHtmlCell>> for SpecHtmlRow {
    fn from(cells: Vec<SpecHtmlCell>) -> Self {
        Self { cells }
    }
}

/// One top-level `<table>` element, detached from the parser's DOM.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecHtmlTable {
    /// Raw text of the first `<caption>` child.
    pub caption: Option<String>,
    /// `id` attribute.
    pub id: Option<String>,
    /// Rows of this table (nested tables excluded).
    pub rows: Vec<SpecHtmlRow>,
}

/// Parsed document: its top-level tables plus parser recovery messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecHtmlDocument {
    /// Top-level tables in document order.
    pub tables: Vec<SpecHtmlTable>,
    /// Recovery messages emitted by the HTML parser (malformed markup).
    pub parse_errors: Vec<String>,
}

/// Listing entry used to let a caller choose tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableSummary {
    /// Zero-based position of the table in the document.
    pub index: usize,
    /// Caption text, else id, else `Table N`.
    pub label: String,
    /// Number of `<tr>` rows.
    pub n_rows: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Grid

/// Inclusive, zero-based merge rectangle owned by one origin cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecMergeRegion {
    /// Origin row.
    pub row_idx_start: usize,
    /// Origin column.
    pub col_idx_start: usize,
    /// Last covered row (inclusive).
    pub row_idx_end: usize,
    /// Last covered column (inclusive).
    pub col_idx_end: usize,
}

impl SpecMergeRegion {
    /// Whether `(row_idx, col_idx)` lies inside this region.
    pub fn contains(&self, row_idx: usize, col_idx: usize) -> bool {
        (self.row_idx_start..=self.row_idx_end).contains(&row_idx)
            && (self.col_idx_start..=self.col_idx_end).contains(&col_idx)
    }
}

/// Rectangular grid of typed values plus its merge regions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecTableGrid {
    /// Rows of equal length.
    pub rows: Vec<Vec<EnumCellValue>>,
    /// Merge regions ordered by origin `(row, col)`.
    pub merges: Vec<SpecMergeRegion>,
}

impl SpecTableGrid {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExtractOptions

/// What to do with a `colspan`/`rowspan` above [`SpecExtractOptions::span_max`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSpanOverflowRule {
    /// Clamp to `span_max` and record a warning (default).
    #[default]
    Clamp,
    /// Reject the whole table with [`HtmlTableError::SpanOverflow`].
    Reject,
}

/// Options for grid extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExtractOptions {
    /// Largest span honored for either direction.
    pub span_max: usize,
    /// Overflow handling.
    pub rule_span_overflow: EnumSpanOverflowRule,
}

impl Default for SpecExtractOptions {
    fn default() -> Self {
        Self {
            span_max: N_SPAN_MAX_DEFAULT,
            rule_span_overflow: EnumSpanOverflowRule::Clamp,
        }
    }
}

/// Non-fatal notes collected while extracting one table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExtractReport {
    /// Warning messages.
    pub warnings: Vec<String>,
}

impl SpecExtractReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Expected failures of table selection and extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtmlTableError {
    /// Document contains no `<table>`.
    #[error("No tables found in HTML.")]
    NoTablesFound,
    /// Caller selected zero tables.
    #[error("No tables selected for conversion.")]
    EmptySelection,
    /// Selected index does not name a table.
    #[error("Table index {index} out of range ({count} tables detected).")]
    SelectionOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of tables in the document.
        count: usize,
    },
    /// A span exceeded `span_max` under [`EnumSpanOverflowRule::Reject`].
    #[error("{attr}={span} at row {row_idx}, column {col_idx} exceeds span_max={span_max}.")]
    SpanOverflow {
        /// `colspan` or `rowspan`.
        attr: &'static str,
        /// Declared span.
        span: usize,
        /// Configured cap.
        span_max: usize,
        /// Origin row.
        row_idx: usize,
        /// Origin column.
        col_idx: usize,
    },
    /// Invalid extraction options.
    #[error("{0}")]
    InvalidOptions(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
