//! Feed input: local file, gzip file or stdin, with byte counting

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flate2::read::MultiGzDecoder;

/// Buffer size for the input reader (256KB)
const INPUT_BUF_SIZE: usize = 256 * 1024;

/// Shared byte counter for progress tracking
pub type ByteCounter = Arc<AtomicU64>;

/// Opened feed ready for the event source
pub struct Input {
    pub reader: Box<dyn BufRead + Send>,
    /// Raw bytes read so far (compressed bytes for gzip input)
    pub counter: ByteCounter,
    /// Raw input size when known
    pub total_bytes: Option<u64>,
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("read", &self.counter.load(Ordering::Relaxed))
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

/// Open `path` for streaming.
///
/// `-` reads stdin. A `.gz` extension is decompressed on the fly.
pub fn open_input(path: &Path) -> io::Result<Input> {
    let counter = ByteCounter::default();

    if path.as_os_str() == "-" {
        let reader = CountingReader::new(io::stdin(), counter.clone());
        return Ok(Input {
            reader: Box::new(BufReader::with_capacity(INPUT_BUF_SIZE, reader)),
            counter,
            total_bytes: None,
        });
    }

    let file = File::open(path)?;
    let total_bytes = file.metadata().ok().map(|m| m.len());
    let counting = CountingReader::new(file, counter.clone());

    let reader: Box<dyn BufRead + Send> = if is_gzip(path) {
        Box::new(BufReader::with_capacity(
            INPUT_BUF_SIZE,
            MultiGzDecoder::new(counting),
        ))
    } else {
        Box::new(BufReader::with_capacity(INPUT_BUF_SIZE, counting))
    };

    Ok(Input {
        reader,
        counter,
        total_bytes,
    })
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Reader wrapper that tracks bytes read
pub struct CountingReader<R> {
    inner: R,
    count: ByteCounter,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R, count: ByteCounter) -> Self {
        Self { inner, count }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}
