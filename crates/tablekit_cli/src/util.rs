//! Input acquisition and display helpers for the CLI.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::Utc;
use tablekit_io_xlsx::derive_output_file_name;

/// Default acquisition limit (10 MiB).
pub const N_INPUT_BYTES_MAX_DEFAULT: u64 = 10 * 1024 * 1024;
const C_INPUT_STDIN: &str = "-";
const TUP_SIZE_UNITS: [&str; 4] = ["BYTES", "KB", "MB", "GB"];

/// Whether `input` names stdin rather than a file.
pub fn is_stdin_input(input: &Path) -> bool {
    input.as_os_str() == C_INPUT_STDIN
}

/// Read HTML from a file or stdin, rejecting inputs above `n_bytes_max`.
pub fn read_input_html(input: &Path, n_bytes_max: u64) -> anyhow::Result<String> {
    let v_bytes = if is_stdin_input(input) {
        let mut v_bytes = Vec::new();
        io::stdin()
            .lock()
            .take(n_bytes_max.saturating_add(1))
            .read_to_end(&mut v_bytes)
            .context("Failed to read HTML from stdin")?;
        validate_input_size(v_bytes.len() as u64, n_bytes_max)?;
        v_bytes
    } else {
        let metadata = fs::metadata(input)
            .with_context(|| format!("Failed to read input file: {}", input.display()))?;
        validate_input_size(metadata.len(), n_bytes_max)?;
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input.display()))?
    };

    Ok(String::from_utf8_lossy(&v_bytes).into_owned())
}

fn validate_input_size(n_bytes: u64, n_bytes_max: u64) -> anyhow::Result<()> {
    if n_bytes > n_bytes_max {
        bail!(
            "File too large ({} > {})",
            format_file_size(n_bytes),
            format_file_size(n_bytes_max)
        );
    }
    Ok(())
}

/// Output path: explicit `--output`, else `<input stem>.xlsx` or a
/// timestamped name in the current directory.
pub fn resolve_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(path_out) = output {
        return path_out.to_path_buf();
    }
    let path_in = (!is_stdin_input(input)).then_some(input);
    PathBuf::from(derive_output_file_name(path_in, Utc::now()))
}

/// Human-readable size, base 1024, rounded to two decimals: `12.5 MB`.
pub fn format_file_size(n_bytes: u64) -> String {
    if n_bytes == 0 {
        return format!("0 {}", TUP_SIZE_UNITS[0]);
    }

    let mut n_value = n_bytes as f64;
    let mut n_idx_unit = 0usize;
    while n_value >= 1024.0 && n_idx_unit < TUP_SIZE_UNITS.len() - 1 {
        n_value /= 1024.0;
        n_idx_unit += 1;
    }
    let n_value_rounded = (n_value * 100.0).round() / 100.0;
    format!("{n_value_rounded} {}", TUP_SIZE_UNITS[n_idx_unit])
}
