//! Line-based stand-in for the CRAM decoder.
//!
//! A file is `@TXT` followed by one read per line: `SEQ<TAB>q,q,...`. An
//! empty quality field means the read has no qualities. A `@PANIC` line
//! makes the decoder panic, the way a library bug would.

use crate::core::io::{Archive, ArchiveDecoder};
use crate::core::model::ReadView;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

pub struct TextDecoder;

pub struct TextArchive {
    lines: std::vec::IntoIter<String>,
}

impl ArchiveDecoder for TextDecoder {
    type Archive = TextArchive;

    fn open(&self, path: &Path) -> Result<TextArchive> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        Ok(TextArchive {
            lines: lines.into_iter(),
        })
    }
}

impl Archive for TextArchive {
    fn read_header(&mut self) -> Result<()> {
        match self.lines.next() {
            Some(line) if line == "@TXT" => Ok(()),
            Some(line) if line == "@PANIC" => panic!("header decoder fault"),
            _ => bail!("missing @TXT header"),
        }
    }

    fn read_records(&mut self, visit: &mut dyn FnMut(ReadView<'_>)) -> Result<()> {
        for line in self.lines.by_ref() {
            if line == "@PANIC" {
                panic!("record decoder fault");
            }
            let (seq, qual) = line.split_once('\t').context("malformed record")?;
            let qual: Vec<u8> = if qual.is_empty() {
                Vec::new()
            } else {
                qual.split(',')
                    .map(|q| q.parse::<u8>())
                    .collect::<Result<_, _>>()?
            };
            visit(ReadView {
                seq: seq.as_bytes(),
                qual: &qual,
            });
        }
        Ok(())
    }
}

/// Renders reads as a `TextDecoder` file body, every base at quality `q`.
pub fn text_archive(reads: &[(&str, u8)]) -> String {
    let mut out = String::from("@TXT\n");
    for (seq, q) in reads {
        let quals: Vec<String> = (0..seq.len()).map(|_| q.to_string()).collect();
        out.push_str(&format!("{}\t{}\n", seq, quals.join(",")));
    }
    out
}
