//! `feedline run` - stream a feed into batches

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use feedline_core::{
    DirSink, HttpSink, NullSink, PipelineError, ProgressContext, QueuedSink, Recovery, ReportSink,
    Sink, XmlEventSource, open_input, run_pipeline, shutdown_flag,
};

use crate::config::{Config, SinkKind};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Feed to read (`-` for stdin, `.gz` is decompressed)
    pub input: PathBuf,

    /// Where batches go
    #[arg(short, long, value_enum)]
    pub sink: Option<SinkKind>,

    /// Output directory for the dir sink
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Endpoint for the http sink
    #[arg(long)]
    pub url: Option<String>,

    /// Byte budget per batch
    #[arg(short, long)]
    pub threshold_bytes: Option<usize>,

    /// Fail on items that are never closed instead of discarding them
    #[arg(long)]
    pub strict: bool,

    /// Send batches from a separate thread with this many pending batches
    #[arg(short, long)]
    pub queue: Option<usize>,
}

type BoxedSink = Box<dyn Sink + Send>;

fn build_sink(kind: SinkKind, args: &RunArgs, config: &Config) -> Result<BoxedSink> {
    let sink: BoxedSink = match kind {
        SinkKind::Report => {
            let color = std::io::stdout().is_terminal();
            Box::new(ReportSink::new(std::io::stdout(), color))
        }
        SinkKind::Dir => {
            let dir = args.out.clone().unwrap_or_else(|| config.sink.dir.clone());
            let sink = DirSink::new(&dir)
                .with_context(|| format!("Failed to prepare output directory {}", dir.display()))?;
            log::info!("Writing batches to {}", dir.display());
            Box::new(sink)
        }
        SinkKind::Http => {
            let Some(url) = args.url.as_deref().or(config.http.url.as_deref()) else {
                bail!("http sink needs --url or [http] url in the config file");
            };
            log::info!("Posting batches to {url}");
            Box::new(HttpSink::new(config.http.sink_config(url)).context("Failed to build HTTP client")?)
        }
        SinkKind::Null => Box::new(NullSink),
    };
    Ok(sink)
}

pub fn run(args: RunArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let mut pipeline_config = config.pipeline();
    if let Some(threshold) = args.threshold_bytes {
        pipeline_config.threshold_bytes = threshold;
    }
    if args.strict {
        pipeline_config.recovery = Recovery::Strict;
    }
    let kind = args.sink.unwrap_or(config.sink.kind);
    let queue = args.queue.unwrap_or(config.batch.queue);

    let input = open_input(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string());
    let pb = progress.input_bar(&name, input.total_bytes);

    log::info!(
        "Reading {} (threshold {} bytes, {} sink{})",
        args.input.display(),
        pipeline_config.threshold_bytes,
        kind,
        if queue > 0 { ", queued" } else { "" }
    );

    let sink = build_sink(kind, &args, config)?;
    let mut source = XmlEventSource::new(input.reader);
    let counter = input.counter;

    let result = if queue > 0 {
        let queued = QueuedSink::spawn(sink, queue).context("Failed to start sender thread")?;
        run_pipeline(&mut source, &pipeline_config, queued, &counter, shutdown_flag(), &pb)
            .and_then(|(queued, summary)| {
                queued.finish().map_err(PipelineError::Sink)?;
                Ok(summary)
            })
    } else {
        run_pipeline(&mut source, &pipeline_config, sink, &counter, shutdown_flag(), &pb)
            .map(|(_, summary)| summary)
    };
    pb.finish_and_clear();

    match result {
        Ok(summary) => {
            summary.log();
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            log::warn!("Interrupted at byte {}, trailing batch not sent", source.position());
            Err(e).context("run interrupted")
        }
        Err(e) => Err(e).with_context(|| format!("Failed to process {}", args.input.display())),
    }
}

