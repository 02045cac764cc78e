//! Batch sinks — the destination of every flushed payload

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;

use crate::accumulator::ONE_MEGABYTE;

/// Destination for batch payloads.
///
/// `payload` is a JSON array of records. The accumulator calls `send`
/// exactly once per flushed batch, in closure order, and surfaces any
/// error unchanged.
pub trait Sink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        (**self).send(payload)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        (**self).send(payload)
    }
}

/// Collects payloads in memory
impl Sink for Vec<Vec<u8>> {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.push(payload.to_vec());
        Ok(())
    }
}

/// Discards every payload
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn send(&mut self, _payload: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// Prints a short report per received batch
pub struct ReportSink<W> {
    out: W,
    color: bool,
    batch_num: usize,
}

impl<W> std::fmt::Debug for ReportSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSink")
            .field("batch_num", &self.batch_num)
            .finish_non_exhaustive()
    }
}

impl<W: Write> ReportSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            batch_num: 0,
        }
    }

    /// Batches reported so far
    pub fn batches(&self) -> usize {
        self.batch_num
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for ReportSink<W> {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let records: Vec<IgnoredAny> = serde_json::from_slice(payload).map_err(io::Error::other)?;
        self.batch_num += 1;

        let (bold, reset) = if self.color {
            ("\x1b[1m", "\x1b[22m")
        } else {
            ("", "")
        };
        let megabytes = payload.len() as f64 / ONE_MEGABYTE as f64;
        writeln!(self.out, "{bold}Received batch{:4}{reset}", self.batch_num)?;
        writeln!(self.out, "Size: {megabytes:10.2}MB")?;
        writeln!(self.out, "Products: {:8}", records.len())?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Writes each batch to its own file with atomic tmp→rename
#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
    written: usize,
}

impl DirSink {
    /// Create the directory if needed and clear stale tmp files
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        cleanup_tmp_files(&dir)?;
        Ok(Self { dir, written: 0 })
    }

    /// Path of the `n`th batch file (1-based)
    pub fn batch_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("batch_{n:06}.json"))
    }

    /// Batch files written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl Sink for DirSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let final_path = self.batch_path(self.written + 1);
        let mut tmp_name = final_path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = File::create(&tmp_path)?;
        file.write_all(payload)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &final_path)?;

        self.written += 1;
        Ok(())
    }
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
