use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

use depmark::MarkConfig;

/// Mark duplicate-run DEP rows in an xlsx/xlsm workbook, preserving every
/// other byte of the package (macros, formulas, charts included).
#[derive(Parser)]
#[command(name = "depmark", version)]
struct Args {
    /// Workbook to process (.xlsx or .xlsm).
    input: PathBuf,

    /// Output path. Defaults to the engine-derived filename
    /// (`<stem>_WEBPT.processed<ext>`) next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file overriding the default marking policy (marker token,
    /// fill color, header rules, grouping rule, ...).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let bytes = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let filename = args
        .input
        .file_name()
        .and_then(OsStr::to_str)
        .context("input path has no usable file name")?;

    let result = depmark::process(&bytes, filename, &config)?;

    let out_path = args
        .output
        .unwrap_or_else(|| args.input.with_file_name(&result.filename));
    write_atomic(&out_path, &result.bytes)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    println!(
        "{}",
        serde_json::json!({
            "output": out_path.display().to_string(),
            "marked_rows": result.marked_rows,
            "total_rows": result.total_rows,
        })
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<MarkConfig> {
    match path {
        Some(path) => {
            let raw = fs::read(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(MarkConfig::default()),
    }
}

/// Write via a temp file in the target directory and rename into place, so
/// a crash never leaves a half-written workbook behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };
    tmp.write_all(bytes)?;
    tmp.persist(path)?;
    Ok(())
}
