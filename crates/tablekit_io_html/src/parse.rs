//! HTML adapter: parse markup with `sxd_html` and detach top-level tables
//! into owned [`SpecHtmlTable`] models.

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use tracing::{debug, warn};

use crate::conf::{
    C_PARSE_ERROR_INITIAL_MODE, C_TAG_CAPTION, C_TAG_ROW, C_TAG_TABLE, TUP_TAG_CELLS,
};
use crate::spec::{SpecHtmlCell, SpecHtmlDocument, SpecHtmlRow, SpecHtmlTable, SpecTableSummary};
use crate::util::describe_tables;

/// Parse an HTML document and collect its top-level tables.
///
/// Parsing never fails: malformed markup is recovered by the parser and its
/// messages are kept in [`SpecHtmlDocument::parse_errors`]. A missing DOCTYPE
/// is not reported, so a pasted `<table>` fragment is not malformed. Tables
/// nested inside another table are not listed separately.
pub fn parse_html_document(html: &str) -> SpecHtmlDocument {
    let (package, l_errors) = sxd_html::parse_html_with_errors(html);
    let document = package.as_document();

    let mut l_stack: Vec<Element<'_>> = document
        .root()
        .children()
        .into_iter()
        .rev()
        .filter_map(|child| match child {
            ChildOfRoot::Element(element) => Some(element),
            _ => None,
        })
        .collect();

    let mut l_tables = Vec::new();
    while let Some(element) = l_stack.pop() {
        if is_tag(element, C_TAG_TABLE) {
            l_tables.push(derive_html_table(element));
            continue;
        }
        l_stack.extend(child_elements(element).into_iter().rev());
    }

    let parse_errors: Vec<String> = l_errors
        .into_iter()
        .map(|err| err.to_string())
        .filter(|c_err| !c_err.contains(C_PARSE_ERROR_INITIAL_MODE))
        .collect();
    if !parse_errors.is_empty() {
        warn!(
            n_errors = parse_errors.len(),
            "malformed HTML detected, attempting recovery"
        );
    }
    debug!(n_tables = l_tables.len(), "parsed HTML document");

    SpecHtmlDocument {
        tables: l_tables,
        parse_errors,
    }
}

impl SpecHtmlDocument {
    /// Parse markup, see [`parse_html_document`].
    pub fn parse(html: &str) -> Self {
        parse_html_document(html)
    }

    /// Listing entries for every detected table.
    pub fn describe_tables(&self) -> Vec<SpecTableSummary> {
        describe_tables(&self.tables)
    }

    /// Whether the parser had to recover from malformed markup.
    pub fn is_malformed(&self) -> bool {
        !self.parse_errors.is_empty()
    }
}

fn derive_html_table(element: Element<'_>) -> SpecHtmlTable {
    let caption = child_elements(element)
        .into_iter()
        .find(|child| is_tag(*child, C_TAG_CAPTION))
        .map(derive_text_content);

    let mut l_rows = Vec::new();
    collect_rows(element, &mut l_rows);

    SpecHtmlTable {
        caption,
        id: element.attribute_value("id").map(ToString::to_string),
        rows: l_rows,
    }
}

/// Rows of `element`'s subtree, through row groups but not into nested tables.
fn collect_rows(element: Element<'_>, rows: &mut Vec<SpecHtmlRow>) {
    for child in child_elements(element) {
        if is_tag(child, C_TAG_ROW) {
            rows.push(derive_html_row(child));
        } else if !is_tag(child, C_TAG_TABLE) {
            collect_rows(child, rows);
        }
    }
}

fn derive_html_row(element: Element<'_>) -> SpecHtmlRow {
    let cells = child_elements(element)
        .into_iter()
        .filter(|child| TUP_TAG_CELLS.iter().any(|tag| is_tag(*child, tag)))
        .map(|child| SpecHtmlCell {
            text: derive_text_content(child),
            colspan: child.attribute_value("colspan").map(ToString::to_string),
            rowspan: child.attribute_value("rowspan").map(ToString::to_string),
        })
        .collect();
    SpecHtmlRow { cells }
}

/// Concatenated text of all descendant text nodes.
fn derive_text_content(element: Element<'_>) -> String {
    let mut c_text = String::new();
    append_text_content(element, &mut c_text);
    c_text
}

fn append_text_content(element: Element<'_>, buf: &mut String) {
    for child in element.children() {
        match child {
            ChildOfElement::Text(text) => buf.push_str(text.text()),
            ChildOfElement::Element(child_element) => append_text_content(child_element, buf),
            _ => {}
        }
    }
}

fn child_elements(element: Element<'_>) -> Vec<Element<'_>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(child_element) => Some(child_element),
            _ => None,
        })
        .collect()
}

fn is_tag(element: Element<'_>, tag: &str) -> bool {
    element.name().local_part().eq_ignore_ascii_case(tag)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_collects_top_level_tables_in_order() {
        let html = r#"
            <html><body>
              <table id="first"><tr><td>1</td></tr></table>
              <div><table><caption> Second </caption><tr><td>2</td></tr></table></div>
            </body></html>
        "#;

        let document = parse_html_document(html);
        assert_eq!(document.tables.len(), 2);
        assert_eq!(document.tables[0].id.as_deref(), Some("first"));
        assert_eq!(document.tables[0].caption, None);
        assert_eq!(document.tables[1].caption.as_deref(), Some(" Second "));
        assert_eq!(document.tables[1].id, None);
    }

    #[test]
    fn test_parse_reads_rows_through_row_groups() {
        let html = r#"
            <table>
              <thead><tr><th colspan="2">Head</th></tr></thead>
              <tbody>
                <tr><td rowspan="2">a</td><td>b &amp; c</td></tr>
                <tr><td>d</td></tr>
              </tbody>
              <tfoot><tr><td>f</td><td>g</td></tr></tfoot>
            </table>
        "#;

        let document = parse_html_document(html);
        let table = &document.tables[0];
        assert_eq!(table.rows.len(), 4);
        assert_eq!(
            table.rows[0].cells,
            vec![SpecHtmlCell::new("Head").with_colspan("2")]
        );
        assert_eq!(
            table.rows[1].cells,
            vec![
                SpecHtmlCell::new("a").with_rowspan("2"),
                SpecHtmlCell::new("b & c"),
            ]
        );
        assert_eq!(table.rows[3].cells.len(), 2);
    }

    #[test]
    fn test_nested_tables_are_not_flattened() {
        let html = r#"
            <table id="outer">
              <tr><td>x<table id="inner"><tr><td>y</td></tr></table></td></tr>
              <tr><td>z</td></tr>
            </table>
        "#;

        let document = parse_html_document(html);
        assert_eq!(document.tables.len(), 1);
        let table = &document.tables[0];
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.rows[0].cells[0].text, "xy");
    }

    #[test]
    fn test_cell_text_includes_descendants() {
        let html = "<table><tr><td><b>12</b><i>3</i></td><td> <span>a</span>  b </td></tr></table>";

        let document = parse_html_document(html);
        let l_cells = &document.tables[0].rows[0].cells;
        assert_eq!(l_cells[0].text, "123");
        assert_eq!(l_cells[1].text, " a  b ");
    }

    #[test]
    fn test_document_without_tables() {
        let document = parse_html_document("<p>nothing here</p>");
        assert!(document.tables.is_empty());
        assert!(document.describe_tables().is_empty());
    }

    #[test]
    fn test_describe_tables_labels_and_row_counts() {
        let html = r#"
            <table><caption>Sales</caption><tr><td>1</td></tr><tr><td>2</td></tr></table>
            <table id="tbl2"><tr><td>1</td></tr></table>
            <table><tr><td>1</td></tr></table>
        "#;

        let l_summaries = SpecHtmlDocument::parse(html).describe_tables();
        let l_labels: Vec<_> = l_summaries
            .iter()
            .map(|s| (s.index, s.label.as_str(), s.n_rows))
            .collect();
        assert_eq!(
            l_labels,
            vec![(0, "Sales", 2), (1, "tbl2", 1), (2, "Table 3", 1)]
        );
    }

    #[test]
    fn test_malformed_markup_is_recovered_with_messages() {
        let html = r#"<!DOCTYPE html><html><body>
            <table>
              <tr><td>1<td>2</tr>
              <tr><td>3</div></td></tr>
            </table></span>
        </body></html>"#;

        let document = parse_html_document(html);
        assert!(document.is_malformed());
        assert!(
            document
                .parse_errors
                .iter()
                .all(|c_err| !c_err.contains(C_PARSE_ERROR_INITIAL_MODE))
        );

        let table = &document.tables[0];
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].cells,
            vec![SpecHtmlCell::new("1"), SpecHtmlCell::new("2")]
        );
        assert_eq!(table.rows[1].cells, vec![SpecHtmlCell::new("3")]);
    }

    #[test]
    fn test_well_formed_markup_has_no_parse_errors() {
        let document = parse_html_document(
            "<!DOCTYPE html><html><body><table><tr><td>1</td></tr></table></body></html>",
        );
        assert!(!document.is_malformed());

        let document = parse_html_document("<table><tr><td>1</td></tr></table>");
        assert_eq!(document.parse_errors, Vec::<String>::new());
        assert_eq!(document.tables.len(), 1);
    }
}
