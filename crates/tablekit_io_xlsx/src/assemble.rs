//! Workbook assembly: name sheets and attach merge regions in input order.

use crate::spec::{SpecSheet, SpecSheetInput, SpecWorkbook};
use crate::util::derive_sheet_label;

/// Build a workbook from extracted tables, preserving input order.
///
/// Each sheet is labelled by [`derive_sheet_label`] using its position in
/// `inputs`. Labels are kept verbatim even when two inputs collide; the
/// writer makes names unique when serializing.
pub fn assemble_workbook(inputs: Vec<SpecSheetInput<'_>>) -> SpecWorkbook {
    let sheets = inputs
        .into_iter()
        .enumerate()
        .map(|(n_position, input)| {
            let merges = if input.grid.merges.is_empty() {
                None
            } else {
                Some(input.grid.merges)
            };
            SpecSheet {
                name: derive_sheet_label(input.table, n_position),
                rows: input.grid.rows,
                merges,
            }
        })
        .collect();

    SpecWorkbook { sheets }
}
