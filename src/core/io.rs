use crate::core::model::ReadView;
use anyhow::{Context, Result, bail};
use noodles::cram;
use noodles::fasta::{self, repository::Adapter};
use noodles::sam::{self, header::record::value::map::reference_sequence::tag};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::mem;
use std::path::{Path, PathBuf};

/// Opens alignment archives. Shared by every worker of a run.
pub trait ArchiveDecoder: Sync {
    type Archive: Archive;

    fn open(&self, path: &Path) -> Result<Self::Archive>;
}

/// An opened archive. Dropping it releases the file and decoder buffers.
pub trait Archive {
    fn read_header(&mut self) -> Result<()>;

    /// Visits each read in stream order until end of stream.
    ///
    /// A decode error ends the stream; it is returned after every read
    /// decoded before it has been visited.
    fn read_records(&mut self, visit: &mut dyn FnMut(ReadView<'_>)) -> Result<()>;
}

/// CRAM decoding through noodles.
///
/// Reference sequences are looked up in the local FASTA files named by the
/// header's `@SQ UR:` fields. A slice that needs a sequence with no such
/// source fails to decode.
pub struct CramDecoder;

impl ArchiveDecoder for CramDecoder {
    type Archive = CramArchive;

    fn open(&self, path: &Path) -> Result<CramArchive> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Ok(CramArchive {
            state: State::Opened(BufReader::new(file)),
        })
    }
}

pub struct CramArchive {
    state: State,
}

enum State {
    Opened(BufReader<File>),
    Ready {
        reader: cram::io::Reader<BufReader<File>>,
        header: sam::Header,
    },
    Failed,
}

impl Archive for CramArchive {
    fn read_header(&mut self) -> Result<()> {
        let inner = match mem::replace(&mut self.state, State::Failed) {
            State::Opened(inner) => inner,
            _ => bail!("CRAM header can only be read once"),
        };

        let mut reader = cram::io::Reader::new(inner);
        let header = reader.read_header().context("failed to read CRAM header")?;

        // The header container has been consumed; the rebuilt reader resumes
        // at the first data container.
        let reader = cram::io::reader::Builder::default()
            .set_reference_sequence_repository(reference_repository(&header))
            .build_from_reader(reader.into_inner());

        self.state = State::Ready { reader, header };
        Ok(())
    }

    fn read_records(&mut self, visit: &mut dyn FnMut(ReadView<'_>)) -> Result<()> {
        let State::Ready { reader, header } = &mut self.state else {
            bail!("CRAM header must be read before records");
        };
        for result in reader.records(header) {
            let record = result.context("failed to decode CRAM record")?;
            visit(ReadView {
                seq: record.sequence().as_ref(),
                qual: record.quality_scores().as_ref(),
            });
        }
        Ok(())
    }
}

fn reference_repository(header: &sam::Header) -> fasta::Repository {
    let sources = header
        .reference_sequences()
        .iter()
        .filter_map(|(name, map)| {
            let uri = map.other_fields().get(&tag::URI)?;
            let path = local_path(std::str::from_utf8(uri.as_slice()).ok()?)?;
            Some((name.to_vec(), path))
        })
        .collect();
    fasta::Repository::new(HeaderReferences { sources })
}

/// `UR` values are either plain paths or `file://` URIs. Remote URIs have no
/// local source.
fn local_path(uri: &str) -> Option<PathBuf> {
    if let Some(path) = uri.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if uri.is_empty() || uri.contains("://") {
        return None;
    }
    Some(PathBuf::from(uri))
}

/// Reference sequences keyed by `@SQ` name.
struct HeaderReferences {
    sources: HashMap<Vec<u8>, PathBuf>,
}

impl Adapter for HeaderReferences {
    // Always answers: a missing source is an error, never "no sequence".
    fn get(&mut self, name: &[u8]) -> Option<io::Result<fasta::Record>> {
        let Some(path) = self.sources.get(name) else {
            return Some(Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "no local reference for {}",
                    String::from_utf8_lossy(name)
                ),
            )));
        };
        Some(load_reference(path, name))
    }
}

/// Reads one sequence, through the `.fai` index when there is one.
fn load_reference(path: &Path, name: &[u8]) -> io::Result<fasta::Record> {
    if let Ok(reader) = fasta::io::indexed_reader::Builder::default().build_from_path(path) {
        let mut adapter = fasta::repository::adapters::IndexedReader::new(reader);
        if let Some(record) = adapter.get(name) {
            return record;
        }
    }

    let mut reader = fasta::io::reader::Builder::default().build_from_path(path)?;
    for result in reader.records() {
        let record = result?;
        if record.name() == name {
            return Ok(record);
        }
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!(
            "{} not found in {}",
            String::from_utf8_lossy(name),
            path.display()
        ),
    ))
}
