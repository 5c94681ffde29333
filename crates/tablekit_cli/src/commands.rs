//! Subcommand implementations.

use std::fs;

use anyhow::Context;
use tablekit_io_html::SpecHtmlDocument;
use tablekit_io_xlsx::{SpecConvertOptions, convert_document_to_xlsx};
use tracing::{info, warn};

use crate::util::{format_file_size, read_input_html, resolve_output_path};
use crate::{ConvertArgs, InputArgs};

fn load_document(args: &InputArgs) -> anyhow::Result<SpecHtmlDocument> {
    let c_html = read_input_html(&args.input, args.max_input_bytes)?;
    info!(
        input = %args.input.display(),
        size = %format_file_size(c_html.len() as u64),
        "loaded HTML"
    );
    Ok(SpecHtmlDocument::parse(&c_html))
}

/// `tablekit list`: one line per detected table.
pub fn run_list(args: &InputArgs) -> anyhow::Result<()> {
    let document = load_document(args)?;
    if document.tables.is_empty() {
        println!("No tables found.");
        return Ok(());
    }

    for summary in document.describe_tables() {
        println!("{}: {} ({} rows)", summary.index, summary.label, summary.n_rows);
    }
    Ok(())
}

/// `tablekit convert`: write selected tables to an `.xlsx` file.
pub fn run_convert(args: &ConvertArgs) -> anyhow::Result<()> {
    let document = load_document(&args.input)?;

    let l_selection: Vec<usize> = if args.tables.is_empty() {
        (0..document.tables.len()).collect()
    } else {
        args.tables.clone()
    };

    let mut cfg_convert_options = SpecConvertOptions {
        num_workers_max: args.workers,
        ..Default::default()
    };
    cfg_convert_options.extract_options.span_max = args.span_max;
    cfg_convert_options.extract_options.rule_span_overflow = args.span_overflow.into();

    let output = convert_document_to_xlsx(&document, &l_selection, &cfg_convert_options)
        .context("Conversion failed")?;
    for c_warning in output
        .warnings
        .iter()
        .chain(output.reports.iter().flat_map(|report| report.warnings.iter()))
    {
        warn!("{c_warning}");
    }

    let path_file_out = resolve_output_path(&args.input.input, args.output.as_deref());
    fs::write(&path_file_out, &output.bytes)
        .with_context(|| format!("Failed to write output file: {}", path_file_out.display()))?;

    info!(n_sheets = output.reports.len(), "conversion complete");
    println!(
        "{} ({})",
        path_file_out.display(),
        format_file_size(output.bytes.len() as u64)
    );
    Ok(())
}
