//! Sample source: files holding one JSON document per line.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};

const PROGRESS_EVERY: u64 = 100_000;
/// Lines decoded together before they are folded.
pub const CHUNK_LINES: usize = 10_000;

/// Where samples come from and how each line is narrowed.
#[derive(Clone, Debug, Default)]
pub struct SourceSettings {
    pub inputs: Vec<String>,
    /// JSON Pointer applied to every decoded line (e.g. `/payload/event`).
    pub json_pointer: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub files: usize,
    pub lines: u64,
    pub samples: u64,
    /// Lines the JSON Pointer did not resolve in.
    pub skipped: u64,
}

/// Printable ASCII and tab only, trimmed.
pub fn clean_line(raw: &str) -> String {
    let kept: String = raw.chars().filter(|&c| matches!(c, ' '..='~' | '\t')).collect();
    kept.trim_matches([' ', '\t']).to_string()
}

impl SourceSettings {
    /// Feed every sample, in file then line order, to `apply`.
    ///
    /// Each file is read in chunks of [`CHUNK_LINES`] lines; a chunk is
    /// decoded in parallel and folded in order before the next one is read.
    /// Any undecodable line aborts the whole read.
    pub fn load_process(&self, mut apply: impl FnMut(Value)) -> Result<SourceStats> {
        let paths = resolve_file_path_patterns(&self.inputs)?;
        let mut stats = SourceStats { files: paths.len(), ..SourceStats::default() };
        for path in &paths {
            let before = stats.samples;
            let read_error = |source| Error::Read { path: path.to_path_buf(), source };
            let mut reader = BufReader::new(File::open(path).map_err(read_error)?);
            let mut chunk: Vec<(usize, String)> = Vec::with_capacity(CHUNK_LINES);
            let mut buf = Vec::new();
            let mut line_no = 0;
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).map_err(read_error)? == 0 {
                    break;
                }
                line_no += 1;
                let line = clean_line(&String::from_utf8_lossy(&buf));
                if !line.is_empty() {
                    chunk.push((line_no, line));
                }
                if chunk.len() == CHUNK_LINES {
                    self.fold(decode_chunk(path, &chunk)?, &mut stats, &mut apply);
                    chunk.clear();
                }
            }
            self.fold(decode_chunk(path, &chunk)?, &mut stats, &mut apply);
            info!(file = %path.display(), samples = stats.samples - before, "read input file");
        }
        if stats.skipped > 0 {
            info!(skipped = stats.skipped, pointer = ?self.json_pointer, "lines without the selected node");
        }
        Ok(stats)
    }

    fn fold(&self, values: Vec<Value>, stats: &mut SourceStats, apply: &mut impl FnMut(Value)) {
        for mut value in values {
            stats.lines += 1;
            if stats.lines % PROGRESS_EVERY == 0 {
                info!(lines = stats.lines, "processing samples");
            }
            let value = match self.json_pointer.as_deref() {
                None => value,
                Some(pointer) => match value.pointer_mut(pointer).map(Value::take) {
                    Some(v) => v,
                    None => {
                        stats.skipped += 1;
                        continue;
                    }
                },
            };
            stats.samples += 1;
            apply(value);
        }
    }
}

/// Decode cleaned `(line number, text)` pairs, keeping their order.
fn decode_chunk(path: &Path, lines: &[(usize, String)]) -> Result<Vec<Value>> {
    lines
        .par_iter()
        .map(|(line, src)| {
            serde_json::from_str::<Value>(src).map_err(|source| Error::Decode {
                path: path.to_path_buf(),
                line: *line,
                source,
            })
        })
        .collect()
}

/// Literal paths pass through untouched; patterns must match at least one file.
pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                return Err(Error::GlobNoMatch { pattern: pattern.to_string() });
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    if out.is_empty() {
        return Err(Error::NoInput);
    }
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
