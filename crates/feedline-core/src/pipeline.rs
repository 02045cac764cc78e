//! Event → record → batch pipeline
//!
//! Wires an [`Extractor`] to a [`BatchAccumulator`]. Everything runs on the
//! caller's stack: one event may emit one record, which may trigger one flush.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use indicatif::ProgressBar;

use crate::accumulator::{BatchAccumulator, BatchStats};
use crate::config::Config;
use crate::error::PipelineError;
use crate::extractor::{Event, Extractor};
use crate::input::ByteCounter;
use crate::progress::fmt_num;
use crate::sink::Sink;
use crate::source::XmlEventSource;

/// Progress update interval (every N items to avoid overhead)
const UPDATE_INTERVAL: usize = 1_000;

/// Pipeline execution summary
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub items: usize,
    /// Partial items dropped by lenient recovery
    pub discarded: usize,
    pub batches: BatchStats,
    pub elapsed: Duration,
}

impl Summary {
    /// Log the summary at info level
    pub fn log(&self) {
        log::info!("=== Feed Summary ===");
        log::info!(
            "Items: {} ({} discarded)",
            fmt_num(self.items),
            fmt_num(self.discarded)
        );
        log::info!(
            "Batches: {} ({} oversized records)",
            fmt_num(self.batches.batches),
            fmt_num(self.batches.oversized)
        );
        log::info!(
            "Payload: {} bytes (largest batch {} bytes)",
            fmt_num(self.batches.payload_bytes),
            fmt_num(self.batches.largest_batch)
        );
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());

        let secs = self.elapsed.as_secs_f64();
        if self.items > 0 && secs > 0.0 {
            log::info!("Throughput: {:.0} items/sec", self.items as f64 / secs);
        }
    }
}

/// Extractor and accumulator driven by one event at a time
pub struct Pipeline<S> {
    extractor: Extractor,
    accumulator: BatchAccumulator<S>,
    started: Instant,
}

impl<S: Sink> Pipeline<S> {
    pub fn new(config: &Config, sink: S) -> Self {
        Self {
            extractor: Extractor::new(config.tags.clone(), config.recovery),
            accumulator: BatchAccumulator::new(sink, config.threshold_bytes),
            started: Instant::now(),
        }
    }

    /// Apply one event; a completed record goes straight to the accumulator
    pub fn handle(&mut self, event: Event<'_>) -> Result<(), PipelineError> {
        if let Some(record) = self.extractor.handle(event)? {
            self.accumulator.submit(&record)?;
        }
        Ok(())
    }

    /// End of stream: flush the trailing batch and return the sink.
    ///
    /// Only call this after the source finished cleanly. On any earlier
    /// error the pipeline is dropped instead, so nothing partial is sent.
    pub fn finish(self) -> Result<(S, Summary), PipelineError> {
        self.extractor.finish()?;
        let items = self.extractor.emitted();
        let discarded = self.extractor.discarded();
        let (sink, batches) = self.accumulator.finalize()?;
        Ok((
            sink,
            Summary {
                items,
                discarded,
                batches,
                elapsed: self.started.elapsed(),
            },
        ))
    }

    /// Records emitted so far
    pub fn items(&self) -> usize {
        self.extractor.emitted()
    }

    /// Batches flushed so far
    pub fn batches(&self) -> usize {
        self.accumulator.stats().batches
    }
}

/// Stream a whole document from `source` into `sink`.
///
/// Fail-fast: a reader error, a strict-mode extraction error, a sink error
/// or a shutdown request returns immediately without the final flush.
pub fn run_pipeline<R: BufRead, S: Sink>(
    source: &mut XmlEventSource<R>,
    config: &Config,
    sink: S,
    counter: &ByteCounter,
    shutdown: &AtomicBool,
    pb: &ProgressBar,
) -> Result<(S, Summary), PipelineError> {
    let mut pipeline = Pipeline::new(config, sink);
    let mut last_reported = 0usize;

    source.drive(|event| {
        if shutdown.load(Ordering::Relaxed) {
            return Err(PipelineError::Cancelled);
        }
        pipeline.handle(event)?;

        let items = pipeline.items();
        if items >= last_reported + UPDATE_INTERVAL {
            last_reported = items;
            pb.set_position(counter.load(Ordering::Relaxed));
            pb.set_message(format!(
                "{} items, {} batches",
                fmt_num(items),
                fmt_num(pipeline.batches())
            ));
        }
        Ok(())
    })?;

    pb.set_position(counter.load(Ordering::Relaxed));
    pipeline.finish()
}
