use crate::cli::args::Cli;
use crate::core::engine::{self, RunConfig};
use crate::core::io::{ArchiveDecoder, CramDecoder};
use crate::core::model::{self, MAX_CANDIDATES};
use crate::core::resolve;
use crate::core::stats::{self, log_stage};
use crate::report;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

pub fn entry() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            eprint!("{}", usage(&program_name()));
            process::exit(1);
        }
    };
    if let Err(e) = run(cli) {
        eprintln!("{}", fatal_line(&e));
        process::exit(1);
    }
    Ok(())
}

/// The whole context chain on one line.
fn fatal_line(err: &anyhow::Error) -> String {
    format!("Error: {:#}", err)
}

fn run(args: Cli) -> Result<()> {
    let t0 = Instant::now();
    summarize(&args.input, &CramDecoder, Path::new("."), num_cpus::get())?;
    println!("Execution Time: {:.2} seconds", t0.elapsed().as_secs_f64());
    Ok(())
}

/// Resolves `input`, aggregates every candidate and writes
/// `<out_dir>/<sample>.sqs`. Returns the report path.
pub fn summarize<D: ArchiveDecoder>(
    input: &str,
    decoder: &D,
    out_dir: &Path,
    threads: usize,
) -> Result<PathBuf> {
    let stats = stats::enabled();
    let t_total = Instant::now();

    let t_resolve = Instant::now();
    let candidates = resolve::resolve(input, MAX_CANDIDATES);
    log_stage(stats, "resolve", t_resolve);
    if candidates.is_empty() {
        bail!("no .cram files for '{}'", input);
    }

    let t_name = Instant::now();
    let sample_name = model::sample_name(input);
    log_stage(stats, "sample-name", t_name);

    let config = RunConfig {
        candidates,
        sample_name: sample_name.clone(),
        threads,
    };

    let t_engine = Instant::now();
    let output = engine::run(config, decoder)?;
    log_stage(stats, "engine", t_engine);
    if stats {
        eprintln!(
            "SQS_STATS input={} files={} skipped={}",
            input, output.ctx.files, output.ctx.skipped
        );
    }

    let t_report = Instant::now();
    let report_path = out_dir.join(format!("{}.sqs", sample_name));
    report::sqs_txt::write(&report_path, &output)
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    log_stage(stats, "report", t_report);
    log_stage(stats, "total", t_total);

    Ok(report_path)
}

fn program_name() -> String {
    env::args_os()
        .next()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sqs-cram".to_string())
}

fn usage(prog: &str) -> String {
    format!(
        "
============================================================
  sqs-cram - CRAM File Quality Summary Generator
============================================================
Usage:
  {prog} <CRAM file | CRAM prefix | directory>

Description:
  Summarizes sequencing quality statistics over one or more
  CRAM files. The single argument may be:
    - an absolute or relative path to one CRAM file
    - a CRAM file name in the current directory
    - a file name prefix; every matching CRAM file in that
      directory is merged into one sample
    - a directory; every CRAM file inside it is merged

  File names containing 'unmatched' are ignored when scanning
  a directory or prefix. At most {MAX_CANDIDATES} files are used.

Examples:
  # Absolute path to a single CRAM file
    {prog} /path/to/14-1671.cram

  # File name in the current directory
    {prog} 14-1671.cram

  # Prefix for multiple CRAM files (420071-S1_QSR-1*.cram)
    {prog} 420071-S1_QSR-1

  # All CRAM files in a directory
    {prog} /path/to/dir

------------------------------------------------------------
Output:
  <sample>.sqs is written to the current directory, where
  <sample> is the last path segment without its extension.
============================================================

"
    )
}
