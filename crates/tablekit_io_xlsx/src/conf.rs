//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{SpecCellFormat, SpecConvertOptions, SpecXlsxWriteOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Sheet name used when sanitizing leaves nothing.
pub const C_SHEET_NAME_FALLBACK: &str = "Sheet";
/// Prefix of synthesized sheet labels (`Table1`, `Table2`, ...).
pub const C_SHEET_LABEL_PREFIX: &str = "Table";
/// File stem used when no input file name is known.
pub const C_FILE_STEM_DEFAULT: &str = "converted_table";
/// Output file extension.
pub const C_FILE_EXT_XLSX: &str = "xlsx";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumFmtKey {
    /// Text cell format.
    Text,
    /// Number cell format.
    Number,
    /// Merged-region format.
    Merge,
}

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<EnumFmtKey, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumFmtKey::Text, cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumFmtKey::Number,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("General".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Merge,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("center".to_string()),
            text_wrap: Some(true),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Build default write options.
pub fn derive_default_xlsx_write_options() -> SpecXlsxWriteOptions {
    SpecXlsxWriteOptions::default()
}

/// Build default conversion options.
pub fn derive_default_convert_options() -> SpecConvertOptions {
    SpecConvertOptions::default()
}
