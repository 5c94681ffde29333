//! HTML table constants and default presets.

use crate::spec::SpecExtractOptions;

/// Default cap for `colspan`/`rowspan`.
pub const N_SPAN_MAX_DEFAULT: usize = 1_000;
/// Span used when the attribute is absent or unusable.
pub const N_SPAN_DEFAULT: usize = 1;

/// Table element.
pub const C_TAG_TABLE: &str = "table";
/// Table caption element.
pub const C_TAG_CAPTION: &str = "caption";
/// Table row element.
pub const C_TAG_ROW: &str = "tr";
/// Cell elements (header and data).
pub const TUP_TAG_CELLS: [&str; 2] = ["th", "td"];

/// Parser message fragment for a document that starts without a DOCTYPE.
///
/// html5ever reports this for every bare fragment; it only selects quirks
/// mode and is not treated as malformed markup.
pub const C_PARSE_ERROR_INITIAL_MODE: &str = "in insertion mode Initial";

/// Prefix of synthesized table labels.
pub const C_TABLE_LABEL_PREFIX: &str = "Table";

/// Build default extraction options.
pub fn derive_default_extract_options() -> SpecExtractOptions {
    SpecExtractOptions::default()
}
