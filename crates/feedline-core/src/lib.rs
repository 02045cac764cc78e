//! Feedline Core - streaming catalog feed extraction with size-bounded batching
//!
//! Reads a large product feed incrementally, extracts one [`Record`] per
//! item and forwards records to a [`Sink`] in batches that stay under a
//! byte budget.
//!
//! # Example
//!
//! ```ignore
//! use feedline_core::{Config, ReportSink, XmlEventSource, open_input, run_pipeline};
//!
//! let input = open_input("feed.xml".as_ref())?;
//! let mut source = XmlEventSource::new(input.reader);
//! let sink = ReportSink::new(std::io::stdout(), false);
//! let (_, summary) = run_pipeline(
//!     &mut source,
//!     &Config::default(),
//!     sink,
//!     &input.counter,
//!     feedline_core::shutdown_flag(),
//!     &indicatif::ProgressBar::hidden(),
//! )?;
//! summary.log();
//! ```

pub mod accumulator;
pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod record;
pub mod retry;
pub mod shutdown;
pub mod sink;
pub mod source;

// Re-exports for convenience
pub use accumulator::{BatchAccumulator, BatchStats, DEFAULT_THRESHOLD_BYTES, ONE_MEGABYTE};
pub use config::Config;
pub use error::PipelineError;
pub use extractor::{Event, ExtractError, Extractor, FeedTags, Recovery};
pub use http::{HttpError, HttpSink, HttpSinkConfig};
pub use input::{ByteCounter, CountingReader, Input, open_input};
pub use logging::{ProgressLogger, init_logging};
pub use pipeline::{Pipeline, Summary, run_pipeline};
pub use progress::{ProgressContext, fmt_num};
pub use queue::{ErrorFlag, QueuedSink};
pub use record::{Field, Record, decode_batch};
pub use retry::{Backoff, Retryable, retry_with_backoff};
pub use shutdown::{request_shutdown, shutdown_flag};
pub use sink::{DirSink, NullSink, ReportSink, Sink, cleanup_tmp_files};
pub use source::XmlEventSource;
