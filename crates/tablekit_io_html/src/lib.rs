//! `tablekit_io_html` v1:
//! HTML table reader and grid extraction kernel.
//!
//! Modules:
//! - `conf`    : constants and default presets
//! - `spec`    : node models, grid models, options, errors
//! - `util`    : pure helper functions (cell values, spans, selection)
//! - `parse`   : HTML adapter over `sxd_html`
//! - `extract` : span resolution into grid + merge regions
pub mod conf;
pub mod extract;
pub mod parse;
pub mod spec;
pub mod util;

pub use conf::{N_SPAN_DEFAULT, N_SPAN_MAX_DEFAULT, derive_default_extract_options};
pub use extract::{extract_table_grid, validate_extract_options};
pub use parse::parse_html_document;
pub use spec::{
    EnumCellValue, EnumSpanOverflowRule, HtmlTableError, SpecExtractOptions, SpecExtractReport,
    SpecHtmlCell, SpecHtmlDocument, SpecHtmlRow, SpecHtmlTable, SpecMergeRegion, SpecTableGrid,
    SpecTableSummary,
};
pub use util::{
    derive_table_label, describe_tables, format_number_canonical, normalize_whitespace,
    parse_cell_value, parse_span, select_tables,
};
