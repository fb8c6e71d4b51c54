use crate::core::io::{Archive, ArchiveDecoder};
use crate::core::metrics::Agg;
use crate::core::stats::{self, log_stage};
use anyhow::{Context, Result, anyhow};
use crossbeam_channel as channel;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

pub struct RunConfig {
    pub candidates: Vec<PathBuf>,
    pub sample_name: String,
    pub threads: usize,
}

pub struct RunContext {
    pub sample_name: String,
    pub files: usize,
    pub skipped: usize,
}

pub struct RunOutput {
    pub agg: Agg,
    pub ctx: RunContext,
}

enum FileOutcome {
    Counted(Agg),
    Skipped,
}

/// Aggregates every candidate into one set of counters.
///
/// Candidates are processed in byte-wise lexicographic order. A file that
/// cannot be opened is reported and skipped; it never fails the run.
pub fn run<D: ArchiveDecoder>(cfg: RunConfig, decoder: &D) -> Result<RunOutput> {
    let stats = stats::enabled();
    let t_total = Instant::now();

    let mut paths = cfg.candidates;
    sort_candidates(&mut paths);

    let threads = cfg.threads.clamp(1, paths.len().max(1));
    let t_scan = Instant::now();
    let outcomes: Vec<FileOutcome> = if threads == 1 {
        paths.iter().map(|p| scan_file(decoder, p)).collect()
    } else {
        scan_parallel(decoder, &paths, threads)?
    };
    log_stage(stats, "engine.scan", t_scan);

    let mut agg = Agg::new();
    let mut skipped = 0usize;
    for outcome in &outcomes {
        match outcome {
            FileOutcome::Counted(part) => agg.merge(part),
            FileOutcome::Skipped => skipped += 1,
        }
    }

    if stats {
        eprintln!(
            "SQS_STATS files={} skipped={} threads={} reads={} bases={}",
            paths.len(),
            skipped,
            threads,
            agg.total_reads,
            agg.total_bases
        );
    }
    log_stage(stats, "engine.total", t_total);

    Ok(RunOutput {
        agg,
        ctx: RunContext {
            sample_name: cfg.sample_name,
            files: paths.len(),
            skipped,
        },
    })
}

pub fn sort_candidates(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| {
        a.as_os_str()
            .as_encoded_bytes()
            .cmp(b.as_os_str().as_encoded_bytes())
    });
}

fn scan_file<D: ArchiveDecoder>(decoder: &D, path: &Path) -> FileOutcome {
    let opened = contain(|| {
        let mut archive = decoder.open(path)?;
        archive.read_header()?;
        Ok(archive)
    });
    let mut archive = match opened {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("Error opening CRAM file: {}: {:#}", path.display(), e);
            return FileOutcome::Skipped;
        }
    };

    let mut agg = Agg::new();
    if let Err(e) = contain(|| archive.read_records(&mut |read| agg.update_read(&read))) {
        eprintln!("Error decoding CRAM file: {}: {:#}", path.display(), e);
    }
    FileOutcome::Counted(agg)
}

/// Runs one decoder step, turning a panic inside the decoder into an error
/// for this file only.
fn contain<T>(step: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(step)).unwrap_or_else(|payload| {
        Err(anyhow!("decoder panicked: {}", panic_message(&*payload)))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown cause"
    }
}

fn scan_parallel<D: ArchiveDecoder>(
    decoder: &D,
    paths: &[PathBuf],
    threads: usize,
) -> Result<Vec<FileOutcome>> {
    let (job_tx, job_rx) = channel::bounded::<(usize, &Path)>(threads * 2);
    let (result_tx, result_rx) = channel::unbounded::<(usize, FileOutcome)>();

    thread::scope(|scope| -> Result<Vec<FileOutcome>> {
        for _ in 0..threads {
            let rx = job_rx.clone();
            let tx = result_tx.clone();
            scope.spawn(move || {
                for (index, path) in rx.iter() {
                    if tx.send((index, scan_file(decoder, path))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        for (index, path) in paths.iter().enumerate() {
            job_tx
                .send((index, path.as_path()))
                .map_err(|_| anyhow!("all workers exited before the last file was queued"))?;
        }
        drop(job_tx);

        let mut parts: Vec<Option<FileOutcome>> = paths.iter().map(|_| None).collect();
        for (index, outcome) in result_rx.iter() {
            parts[index] = Some(outcome);
        }
        parts
            .into_iter()
            .zip(paths)
            .map(|(part, path)| {
                part.with_context(|| format!("no result for {}", path.display()))
            })
            .collect()
    })
}
