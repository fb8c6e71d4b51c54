use crate::core::engine::RunOutput;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SEPARATOR: &str = "------------------------------------------------------";

pub fn render(output: &RunOutput) -> String {
    let agg = &output.agg;
    let metrics = agg.finalize();
    let mut s = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(s, "Sample Name: {}", output.ctx.sample_name);
    let _ = writeln!(s, "Total Bases: {}", agg.total_bases);
    let _ = writeln!(s, "Total Reads: {}", agg.total_reads);
    let _ = writeln!(s, "N Percentage: {:.2}%", metrics.n_percent);
    let _ = writeln!(s, "GC Content: {:.2}%", metrics.gc_percent);
    let _ = writeln!(s, "Q20 Percentage: {:.2}%", metrics.q20_percent);
    let _ = writeln!(s, "Q30 Percentage: {:.2}%", metrics.q30_percent);
    let _ = writeln!(s, "A base count: {}", agg.bases.a);
    let _ = writeln!(s, "T base count: {}", agg.bases.t);
    let _ = writeln!(s, "G base count: {}", agg.bases.g);
    let _ = writeln!(s, "C base count: {}", agg.bases.c);
    let _ = writeln!(s, "N base count: {}", agg.bases.n);
    let _ = writeln!(s, "Q20 Bases: {}", agg.q20_bases);
    let _ = writeln!(s, "Q30 Bases: {}", agg.q30_bases);
    let _ = writeln!(s, "Average Read Length: {:.2}", metrics.avg_read_len);
    let _ = writeln!(s, "{}", SEPARATOR);
    s
}

/// Writes the summary to `path`, replacing any existing file.
pub fn write(path: &Path, output: &RunOutput) -> Result<()> {
    let file = File::create(path).context("create .sqs report failed")?;
    let mut w = BufWriter::new(file);
    w.write_all(render(output).as_bytes())?;
    w.flush()?;
    Ok(())
}
