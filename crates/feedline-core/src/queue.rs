//! Dedicated sender thread for overlapping extraction with transmission

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::JoinHandle;

use crate::sink::Sink;

/// Shared error flag — the worker sets on failure, `QueuedSink` checks before send
pub type ErrorFlag = Arc<AtomicBool>;

/// Hands payloads to one worker thread over a bounded channel.
///
/// The single consumer keeps batches in closure order. When the channel is
/// full, `send` blocks, which bounds memory to `capacity` pending batches.
pub struct QueuedSink<S> {
    sender: Option<SyncSender<Vec<u8>>>,
    error_flag: ErrorFlag,
    worker: Option<JoinHandle<io::Result<S>>>,
    queued: usize,
}

impl<S> std::fmt::Debug for QueuedSink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedSink")
            .field("queued", &self.queued)
            .field("failed", &self.error_flag.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<S: Sink + Send + 'static> QueuedSink<S> {
    /// Spawn the worker thread owning `inner`
    pub fn spawn(inner: S, capacity: usize) -> io::Result<Self> {
        let (sender, rx) = sync_channel(capacity);
        let error_flag = ErrorFlag::default();
        let flag = error_flag.clone();
        let worker = std::thread::Builder::new()
            .name("feedline-sink".to_string())
            .spawn(move || worker_loop(inner, rx, flag))?;

        Ok(Self {
            sender: Some(sender),
            error_flag,
            worker: Some(worker),
            queued: 0,
        })
    }

    /// Close the queue, wait for pending batches and return the inner sink
    pub fn finish(mut self) -> io::Result<S> {
        self.join()
    }

    fn join(&mut self) -> io::Result<S> {
        drop(self.sender.take());
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| io::Error::other("sink worker panicked"))?,
            None => Err(io::Error::other("sink worker already joined")),
        }
    }
}

impl<S> Sink for QueuedSink<S> {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        // Fast-fail: worker already errored
        if self.error_flag.load(Ordering::Relaxed) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "sink worker failed",
            ));
        }
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "sink queue closed"))?;
        sender
            .send(payload.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "sink queue closed"))?;
        self.queued += 1;
        Ok(())
    }
}

impl<S> Drop for QueuedSink<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop<S: Sink>(mut sink: S, rx: Receiver<Vec<u8>>, error_flag: ErrorFlag) -> io::Result<S> {
    for (i, payload) in rx.iter().enumerate() {
        if let Err(e) = sink.send(&payload) {
            log::error!("Sink failed on queued batch {}: {e}", i + 1);
            error_flag.store(true, Ordering::Relaxed);
            return Err(e);
        }
    }
    Ok(sink)
}
