mod commands;
mod util;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tablekit_io_html::{EnumSpanOverflowRule, N_SPAN_MAX_DEFAULT};
use tracing_subscriber::EnvFilter;

use crate::util::N_INPUT_BYTES_MAX_DEFAULT;

const C_LOG_FILTER_DEFAULT: &str = "tablekit_cli=info,tablekit_io_html=info,tablekit_io_xlsx=info";
const C_LOG_FILTER_VERBOSE: &str =
    "tablekit_cli=debug,tablekit_io_html=debug,tablekit_io_xlsx=debug";

#[derive(Parser, Debug)]
#[command(name = "tablekit")]
#[command(about = "Convert HTML tables into an Excel workbook (.xlsx).")]
#[command(long_about = "Convert HTML tables into an Excel workbook (.xlsx).

Every selected <table> becomes one worksheet. rowspan/colspan are resolved
into merged cells, numeric text becomes numeric cells.

EXAMPLES:
  tablekit list page.html                  # Show detected tables
  tablekit convert page.html -t 0,2        # Tables 0 and 2 -> page.xlsx
  cat page.html | tablekit convert - -o out.xlsx")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: EnumCommand,
}

#[derive(Subcommand, Debug)]
enum EnumCommand {
    /// Convert selected tables into an .xlsx workbook
    Convert(ConvertArgs),
    /// List tables detected in the input
    List(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// HTML file, or `-` to read markup from stdin
    input: PathBuf,

    /// Reject inputs larger than this many bytes
    #[arg(long, default_value_t = N_INPUT_BYTES_MAX_DEFAULT)]
    max_input_bytes: u64,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Zero-based table indices in output order (default: all tables)
    #[arg(short, long, value_delimiter = ',')]
    tables: Vec<usize>,

    /// Output file (default: <input stem>.xlsx in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Largest colspan/rowspan honored
    #[arg(long, default_value_t = N_SPAN_MAX_DEFAULT)]
    span_max: usize,

    /// What to do with spans above --span-max
    #[arg(long, value_enum, default_value_t = EnumSpanOverflowArg::Clamp)]
    span_overflow: EnumSpanOverflowArg,

    /// Maximum worker threads for table extraction
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EnumSpanOverflowArg {
    /// Clamp to --span-max and warn
    Clamp,
    /// Fail the conversion
    Reject,
}

impl From<EnumSpanOverflowArg> for EnumSpanOverflowRule {
    fn from(value: EnumSpanOverflowArg) -> Self {
        match value {
            EnumSpanOverflowArg::Clamp => EnumSpanOverflowRule::Clamp,
            EnumSpanOverflowArg::Reject => EnumSpanOverflowRule::Reject,
        }
    }
}

fn init_tracing(if_verbose: bool) {
    let c_filter_default = if if_verbose {
        C_LOG_FILTER_VERBOSE
    } else {
        C_LOG_FILTER_DEFAULT
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| c_filter_default.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        EnumCommand::Convert(args) => commands::run_convert(&args),
        EnumCommand::List(args) => commands::run_list(&args),
    }
}
