//! `tablekit_io_xlsx` v1:
//! Workbook assembly and XLSX serialization for extracted HTML tables.
//!
//! Modules:
//! - `conf`     : constants and default presets
//! - `spec`     : workbook models, options, reports, errors
//! - `util`     : pure helper functions (sheet naming, widths, file naming)
//! - `assemble` : grids -> named sheets
//! - `writer`   : `rust_xlsxwriter`-backed writer kernel
//! - `convert`  : end-to-end HTML -> `.xlsx` pipeline
pub mod assemble;
pub mod conf;
pub mod convert;
pub mod spec;
pub mod util;
pub mod writer;

pub use assemble::assemble_workbook;
pub use conf::{
    C_FILE_EXT_XLSX, C_FILE_STEM_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, derive_default_convert_options,
    derive_default_xlsx_write_options,
};
pub use convert::{convert_document_to_xlsx, convert_html_to_xlsx, convert_html_to_xlsx_all};
pub use spec::{
    EnumAutofitColumnsRule, SpecAutofitCellsPolicy, SpecCellFormat, SpecConvertOptions,
    SpecConvertOutput, SpecSheet, SpecSheetInput, SpecWorkbook, SpecXlsxReport,
    SpecXlsxWriteOptions, XlsxConvertError,
};
pub use util::{
    create_sheet_identifier, derive_output_file_name, derive_sheet_label, sanitize_sheet_name,
};
pub use writer::XlsxWriter;
