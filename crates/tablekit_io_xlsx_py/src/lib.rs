use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBytes};
use tablekit_io_html::{EnumSpanOverflowRule, SpecHtmlDocument};
use tablekit_io_xlsx::conf::derive_default_convert_options;
use tablekit_io_xlsx::spec::{
    EnumAutofitColumnsRule, SpecAutofitCellsPolicy, SpecCellFormat, SpecConvertOptions,
    XlsxConvertError,
};
use tablekit_io_xlsx::{convert_document_to_xlsx, derive_default_xlsx_write_options};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "tablekit.xlsx.convert.v1";

/// Convert tables of `html` into `.xlsx` bytes.
///
/// `tables` selects zero-based table indices in output order; `None` converts
/// every table in document order.
#[pyfunction]
#[pyo3(signature = (
    html,
    tables = None,
    span_max = None,
    span_overflow = "clamp",
    write_options = None,
    num_workers_max = None
))]
fn convert_html_to_xlsx<'py>(
    py: Python<'py>,
    html: &str,
    tables: Option<Vec<usize>>,
    span_max: Option<usize>,
    span_overflow: &str,
    write_options: Option<&Bound<'py, PyAny>>,
    num_workers_max: Option<usize>,
) -> PyResult<Bound<'py, PyBytes>> {
    let mut cfg_convert_options: SpecConvertOptions = derive_default_convert_options();
    if let Some(n_span_max) = span_max {
        cfg_convert_options.extract_options.span_max = n_span_max;
    }
    cfg_convert_options.extract_options.rule_span_overflow =
        parse_rule_span_overflow(span_overflow)?;
    if let Some(cfg_write_options) = parse_spec_xlsx_write_options(write_options)? {
        cfg_convert_options.write_options = cfg_write_options;
    }
    cfg_convert_options.num_workers_max = num_workers_max;

    let document = SpecHtmlDocument::parse(html);
    let l_selection = tables.unwrap_or_else(|| (0..document.tables.len()).collect());

    let output = convert_document_to_xlsx(&document, &l_selection, &cfg_convert_options)
        .map_err(map_convert_error)?;
    Ok(PyBytes::new(py, &output.bytes))
}

/// List detected tables as `(index, label, n_rows)`.
#[pyfunction]
fn list_tables(html: &str) -> Vec<(usize, String, usize)> {
    SpecHtmlDocument::parse(html)
        .describe_tables()
        .into_iter()
        .map(|summary| (summary.index, summary.label, summary.n_rows))
        .collect()
}

fn map_convert_error(err: XlsxConvertError) -> PyErr {
    match &err {
        XlsxConvertError::Table(_)
        | XlsxConvertError::ExcelLimit { .. }
        | XlsxConvertError::InvalidOptions(_) => PyValueError::new_err(err.to_string()),
        XlsxConvertError::Xlsx(_)
        | XlsxConvertError::WriterClosed
        | XlsxConvertError::MissingFileOut => PyRuntimeError::new_err(err.to_string()),
    }
}

fn parse_rule_span_overflow(value: &str) -> PyResult<EnumSpanOverflowRule> {
    match value {
        "clamp" => Ok(EnumSpanOverflowRule::Clamp),
        "reject" => Ok(EnumSpanOverflowRule::Reject),
        _ => Err(PyValueError::new_err(
            "span_overflow must be one of: 'clamp', 'reject'.",
        )),
    }
}

fn parse_rule_autofit_columns(value: &str) -> PyResult<EnumAutofitColumnsRule> {
    match value {
        "none" => Ok(EnumAutofitColumnsRule::None),
        "all" => Ok(EnumAutofitColumnsRule::All),
        _ => Err(PyValueError::new_err(
            "policy_autofit.rule_columns must be one of: 'none', 'all'.",
        )),
    }
}

fn parse_spec_cell_format(obj: Option<&Bound<'_, PyAny>>) -> PyResult<Option<SpecCellFormat>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    if obj.is_none() {
        return Ok(None);
    }

    Ok(Some(SpecCellFormat {
        font_name: extract_optional_attr::<String>(obj, "font_name")?,
        font_size: extract_optional_attr::<i64>(obj, "font_size")?,
        bold: extract_optional_attr::<bool>(obj, "bold")?,
        align: extract_optional_attr::<String>(obj, "align")?,
        valign: extract_optional_attr::<String>(obj, "valign")?,
        border: extract_optional_attr::<i64>(obj, "border")?,
        text_wrap: extract_optional_attr::<bool>(obj, "text_wrap")?,
        num_format: extract_optional_attr::<String>(obj, "num_format")?,
    }))
}

fn parse_spec_autofit_cells_policy(
    obj: Option<&Bound<'_, PyAny>>,
) -> PyResult<Option<SpecAutofitCellsPolicy>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    if obj.is_none() {
        return Ok(None);
    }

    let mut policy = SpecAutofitCellsPolicy::default();

    if let Some(v) = extract_optional_attr::<String>(obj, "rule_columns")? {
        policy.rule_columns = parse_rule_autofit_columns(&v)?;
    }
    if let Some(v) = extract_optional_attr::<usize>(obj, "width_cell_min")? {
        policy.width_cell_min = v;
    }
    if let Some(v) = extract_optional_attr::<usize>(obj, "width_cell_max")? {
        policy.width_cell_max = v;
    }
    if let Some(v) = extract_optional_attr::<usize>(obj, "width_cell_padding")? {
        policy.width_cell_padding = v;
    }

    Ok(Some(policy))
}

/// Overlay attributes of a duck-typed options object onto default write options.
///
/// Format attributes patch the defaults, so `fmt_text=SpecCellFormat(bold=True)`
/// keeps the default font.
fn parse_spec_xlsx_write_options(
    obj: Option<&Bound<'_, PyAny>>,
) -> PyResult<Option<tablekit_io_xlsx::SpecXlsxWriteOptions>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    if obj.is_none() {
        return Ok(None);
    }

    let mut cfg_write_options = derive_default_xlsx_write_options();

    if let Some(fmt_obj) = extract_optional_attr_bound(obj, "fmt_text")?
        && let Some(fmt_patch) = parse_spec_cell_format(Some(&fmt_obj))?
    {
        cfg_write_options.fmt_text = cfg_write_options.fmt_text.with_(fmt_patch);
    }
    if let Some(fmt_obj) = extract_optional_attr_bound(obj, "fmt_number")?
        && let Some(fmt_patch) = parse_spec_cell_format(Some(&fmt_obj))?
    {
        cfg_write_options.fmt_number = cfg_write_options.fmt_number.with_(fmt_patch);
    }
    if let Some(fmt_obj) = extract_optional_attr_bound(obj, "fmt_merge")?
        && let Some(fmt_patch) = parse_spec_cell_format(Some(&fmt_obj))?
    {
        cfg_write_options.fmt_merge = cfg_write_options.fmt_merge.with_(fmt_patch);
    }
    if let Some(policy_obj) = extract_optional_attr_bound(obj, "policy_autofit")?
        && let Some(policy) = parse_spec_autofit_cells_policy(Some(&policy_obj))?
    {
        cfg_write_options.policy_autofit = policy;
    }
    if let Some(v) = extract_optional_attr::<String>(obj, "sheet_name_replace_to")? {
        cfg_write_options.sheet_name_replace_to = v;
    }

    Ok(Some(cfg_write_options))
}

fn extract_optional_attr<T>(obj: &Bound<'_, PyAny>, attr: &str) -> PyResult<Option<T>>
where
    for<'a> T: FromPyObject<'a>,
{
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val.extract::<T>()?))
}

fn extract_optional_attr_bound<'py>(
    obj: &Bound<'py, PyAny>,
    attr: &str,
) -> PyResult<Option<Bound<'py, PyAny>>> {
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val))
}

#[pymodule]
fn _tablekit_io_xlsx_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(convert_html_to_xlsx, module)?)?;
    module.add_function(wrap_pyfunction!(list_tables, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    Ok(())
}
