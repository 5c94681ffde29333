//! Table grid extraction: resolve `colspan`/`rowspan` into a rectangular,
//! address-correct grid plus a merge-region list.
//!
//! Every grid position is owned by exactly one origin cell. Positions covered
//! by a span are tracked in an occupancy map `(row, col) -> (origin_row,
//! origin_col)`; a later cell whose span overlaps an earlier claim takes the
//! contested position over.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::spec::{
    EnumCellValue, EnumSpanOverflowRule, HtmlTableError, SpecExtractOptions, SpecExtractReport,
    SpecHtmlTable, SpecMergeRegion, SpecTableGrid,
};
use crate::util::{parse_cell_value, parse_span};

type TupCellPos = (usize, usize);

/// Extract the grid and merge regions of one table.
///
/// Rows are processed in document order. Within a row, positions already
/// claimed by a span from an earlier row are skipped (padded with
/// [`EnumCellValue::Empty`]) before each cell is placed; a cell's own
/// horizontal span is padded right away. Spans reaching past the last source
/// row or the widest source row are honored: the grid grows to cover them, and
/// all rows are finally padded to the same width.
///
/// Returns [`HtmlTableError::SpanOverflow`] only when a span exceeds
/// `options.span_max` under [`EnumSpanOverflowRule::Reject`].
pub fn extract_table_grid(
    table: &SpecHtmlTable,
    options: &SpecExtractOptions,
    report: &mut SpecExtractReport,
) -> Result<SpecTableGrid, HtmlTableError> {
    validate_extract_options(options)?;

    let mut dict_occupancy: BTreeMap<TupCellPos, TupCellPos> = BTreeMap::new();
    let mut set_origins_contested: BTreeSet<TupCellPos> = BTreeSet::new();
    let mut l_rows: Vec<Vec<EnumCellValue>> = Vec::with_capacity(table.rows.len());

    for (n_idx_row, row) in table.rows.iter().enumerate() {
        let mut l_values = Vec::with_capacity(row.cells.len());
        let mut n_idx_col = 0usize;

        for cell in &row.cells {
            while dict_occupancy.contains_key(&(n_idx_row, n_idx_col)) {
                l_values.push(EnumCellValue::Empty);
                n_idx_col += 1;
            }

            l_values.push(parse_cell_value(&cell.text));

            let n_colspan = resolve_span(
                "colspan",
                parse_span(cell.colspan.as_deref()),
                (n_idx_row, n_idx_col),
                options,
                report,
            )?;
            let n_rowspan = resolve_span(
                "rowspan",
                parse_span(cell.rowspan.as_deref()),
                (n_idx_row, n_idx_col),
                options,
                report,
            )?;

            if n_colspan > 1 || n_rowspan > 1 {
                let tup_origin = (n_idx_row, n_idx_col);
                for n_row in n_idx_row..n_idx_row + n_rowspan {
                    for n_col in n_idx_col..n_idx_col + n_colspan {
                        if (n_row, n_col) == tup_origin {
                            continue;
                        }
                        if let Some(tup_origin_prev) =
                            dict_occupancy.insert((n_row, n_col), tup_origin)
                        {
                            set_origins_contested.insert(tup_origin_prev);
                        }
                    }
                }
                l_values.extend(std::iter::repeat_n(EnumCellValue::Empty, n_colspan - 1));
            }

            n_idx_col += n_colspan;
        }

        l_rows.push(l_values);
    }

    let merges = derive_merge_regions(&dict_occupancy, &set_origins_contested, report);
    pad_to_rectangle(&mut l_rows, &dict_occupancy);

    let grid = SpecTableGrid {
        rows: l_rows,
        merges,
    };
    debug!(
        n_rows = grid.height(),
        n_cols = grid.width(),
        n_merges = grid.merges.len(),
        "extracted table grid"
    );
    Ok(grid)
}

/// Validate extraction options.
pub fn validate_extract_options(options: &SpecExtractOptions) -> Result<(), HtmlTableError> {
    if options.span_max == 0 {
        return Err(HtmlTableError::InvalidOptions(
            "span_max must be >= 1.".to_string(),
        ));
    }
    Ok(())
}

fn resolve_span(
    attr: &'static str,
    n_span: usize,
    tup_origin: TupCellPos,
    options: &SpecExtractOptions,
    report: &mut SpecExtractReport,
) -> Result<usize, HtmlTableError> {
    if n_span <= options.span_max {
        return Ok(n_span);
    }

    let (n_idx_row, n_idx_col) = tup_origin;
    match options.rule_span_overflow {
        EnumSpanOverflowRule::Clamp => {
            warn!(
                attr,
                span = n_span,
                span_max = options.span_max,
                row = n_idx_row,
                col = n_idx_col,
                "span clamped"
            );
            report.warn(format!(
                "{attr}={n_span} at row {n_idx_row}, column {n_idx_col} clamped to {}.",
                options.span_max
            ));
            Ok(options.span_max)
        }
        EnumSpanOverflowRule::Reject => Err(HtmlTableError::SpanOverflow {
            attr,
            span: n_span,
            span_max: options.span_max,
            row_idx: n_idx_row,
            col_idx: n_idx_col,
        }),
    }
}

/// Group occupancy markers by origin into inclusive merge rectangles.
///
/// An origin that lost any position to a later cell keeps its surviving
/// positions as plain placeholders but gets no region, so regions stay
/// pairwise disjoint.
fn derive_merge_regions(
    dict_occupancy: &BTreeMap<TupCellPos, TupCellPos>,
    set_origins_contested: &BTreeSet<TupCellPos>,
    report: &mut SpecExtractReport,
) -> Vec<SpecMergeRegion> {
    let mut dict_extent_by_origin: BTreeMap<TupCellPos, TupCellPos> = BTreeMap::new();
    for (&(n_row, n_col), &tup_origin) in dict_occupancy {
        let tup_extent = dict_extent_by_origin.entry(tup_origin).or_insert(tup_origin);
        tup_extent.0 = usize::max(tup_extent.0, n_row);
        tup_extent.1 = usize::max(tup_extent.1, n_col);
    }

    let mut l_merges = Vec::with_capacity(dict_extent_by_origin.len());
    for ((n_row_start, n_col_start), (n_row_end, n_col_end)) in dict_extent_by_origin {
        if set_origins_contested.contains(&(n_row_start, n_col_start)) {
            report.warn(format!(
                "Overlapping spans: merge at row {n_row_start}, column {n_col_start} dropped."
            ));
            continue;
        }
        l_merges.push(SpecMergeRegion {
            row_idx_start: n_row_start,
            col_idx_start: n_col_start,
            row_idx_end: n_row_end,
            col_idx_end: n_col_end,
        });
    }
    l_merges
}

fn pad_to_rectangle(
    rows: &mut Vec<Vec<EnumCellValue>>,
    dict_occupancy: &BTreeMap<TupCellPos, TupCellPos>,
) {
    let (n_row_max_claimed, n_col_max_claimed) = dict_occupancy.keys().fold(
        (0usize, 0usize),
        |(n_row_max, n_col_max), &(n_row, n_col)| {
            (usize::max(n_row_max, n_row + 1), usize::max(n_col_max, n_col + 1))
        },
    );

    let n_height = usize::max(rows.len(), n_row_max_claimed);
    let n_width = rows
        .iter()
        .map(Vec::len)
        .max()
        .map_or(n_col_max_claimed, |n_len| usize::max(n_len, n_col_max_claimed));

    rows.resize_with(n_height, Vec::new);
    for row in rows.iter_mut() {
        row.resize(n_width, EnumCellValue::Empty);
    }
}
