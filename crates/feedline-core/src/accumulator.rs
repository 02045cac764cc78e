//! Size-bounded batch accumulator
//!
//! Buffers encoded records and hands them to a [`Sink`] as one JSON array
//! payload whenever the next record would push the batch past the byte budget.

use std::io;

use crate::record::Record;
use crate::sink::Sink;

/// One MiB
pub const ONE_MEGABYTE: usize = 1_048_576;

/// Default byte budget per batch (5 MiB).
pub const DEFAULT_THRESHOLD_BYTES: usize = 5 * ONE_MEGABYTE;

/// Open batch: records already encoded into a JSON array body.
///
/// `running_size` counts only record bytes; the array framing
/// (brackets and separating commas) is not part of the budget.
#[derive(Debug, Default)]
struct Batch {
    payload: Vec<u8>,
    records: usize,
    running_size: usize,
}

impl Batch {
    fn push(&mut self, encoded: &[u8]) {
        self.payload.push(if self.records == 0 { b'[' } else { b',' });
        self.payload.extend_from_slice(encoded);
        self.records += 1;
        self.running_size += encoded.len();
    }

    fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Close the array and reset for the next batch
    fn take_payload(&mut self) -> Vec<u8> {
        let mut payload = std::mem::take(&mut self.payload);
        payload.push(b']');
        self.records = 0;
        self.running_size = 0;
        payload
    }

    /// Undo [`take_payload`](Batch::take_payload) after a failed send
    fn restore(&mut self, mut payload: Vec<u8>, records: usize, running_size: usize) {
        payload.pop();
        self.payload = payload;
        self.records = records;
        self.running_size = running_size;
    }
}

/// Counters over everything flushed so far
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub batches: usize,
    pub records: usize,
    /// Sum of record sizes across all flushed batches
    pub record_bytes: usize,
    /// Sum of payload lengths handed to the sink
    pub payload_bytes: usize,
    pub largest_batch: usize,
    /// Records larger than the threshold on their own
    pub oversized: usize,
}

/// Accumulates records and flushes them to `S` in size-bounded batches.
///
/// A flushed batch with two or more records never exceeds `threshold`.
/// A single record larger than `threshold` is sent as its own batch.
pub struct BatchAccumulator<S> {
    sink: S,
    threshold: usize,
    batch: Batch,
    stats: BatchStats,
}

impl<S: std::fmt::Debug> std::fmt::Debug for BatchAccumulator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchAccumulator")
            .field("sink", &self.sink)
            .field("threshold", &self.threshold)
            .field("records", &self.batch.records)
            .field("running_size", &self.batch.running_size)
            .finish_non_exhaustive()
    }
}

impl<S: Sink> BatchAccumulator<S> {
    pub fn new(sink: S, threshold: usize) -> Self {
        Self {
            sink,
            threshold,
            batch: Batch::default(),
            stats: BatchStats::default(),
        }
    }

    /// Add a record, flushing the open batch first if it would overflow.
    ///
    /// A sink error from that flush is returned and `record` is not added.
    pub fn submit(&mut self, record: &Record) -> io::Result<()> {
        let encoded = record.encode()?;
        let size = encoded.len();

        if !self.batch.is_empty() && self.batch.running_size + size > self.threshold {
            self.flush()?;
        }
        if size > self.threshold {
            log::debug!(
                "Record of {size} bytes exceeds threshold of {} bytes",
                self.threshold
            );
            self.stats.oversized += 1;
        }
        self.batch.push(&encoded);
        Ok(())
    }

    /// Send the open batch, if any. Never calls the sink with zero records.
    ///
    /// On a sink error the batch stays open and the error is returned.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let records = self.batch.records;
        let running_size = self.batch.running_size;
        let payload = self.batch.take_payload();

        log::debug!(
            "Flushing batch {}: {records} records, {} bytes",
            self.stats.batches + 1,
            payload.len()
        );
        if let Err(e) = self.sink.send(&payload) {
            self.batch.restore(payload, records, running_size);
            return Err(e);
        }

        self.stats.batches += 1;
        self.stats.records += records;
        self.stats.record_bytes += running_size;
        self.stats.payload_bytes += payload.len();
        self.stats.largest_batch = self.stats.largest_batch.max(payload.len());
        Ok(())
    }

    /// Flush the trailing batch and hand back the sink.
    ///
    /// Consumes the accumulator so nothing can be submitted afterwards.
    pub fn finalize(mut self) -> io::Result<(S, BatchStats)> {
        self.flush()?;
        Ok((self.sink, self.stats))
    }

    /// Records in the open batch
    pub fn len(&self) -> usize {
        self.batch.records
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Encoded size of the records in the open batch
    pub fn running_size(&self) -> usize {
        self.batch.running_size
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, decode_batch};

    /// Record whose encoded form is exactly `size` bytes: `{"id":"xxx"}`
    fn record_of_size(size: usize) -> Record {
        let overhead = br#"{"id":""}"#.len();
        let mut record = Record::default();
        record.set(Field::Id, &"x".repeat(size - overhead));
        assert_eq!(record.encoded_len().unwrap(), size);
        record
    }

    fn sent_records(batches: &[Vec<u8>]) -> Vec<Vec<Record>> {
        batches.iter().map(|b| decode_batch(b).unwrap()).collect()
    }

    #[test]
    fn two_small_records_share_a_batch() {
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 100);
        acc.submit(&record_of_size(40)).unwrap();
        acc.submit(&record_of_size(40)).unwrap();
        assert!(acc.sink().is_empty());
        assert_eq!(acc.running_size(), 80);

        let (sent, stats) = acc.finalize().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent_records(&sent)[0].len(), 2);
        assert_eq!(stats.record_bytes, 80);
        // two records + "[" "," "]"
        assert_eq!(stats.payload_bytes, 83);
    }

    #[test]
    fn overflow_flushes_before_append() {
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 100);
        acc.submit(&record_of_size(60)).unwrap();
        acc.submit(&record_of_size(60)).unwrap();
        assert_eq!(acc.sink().len(), 1);
        acc.submit(&record_of_size(60)).unwrap();
        assert_eq!(acc.sink().len(), 2);

        let (sent, stats) = acc.finalize().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent_records(&sent).iter().all(|b| b.len() == 1));
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.records, 3);
    }

    #[test]
    fn exact_fit_does_not_flush() {
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 100);
        acc.submit(&record_of_size(50)).unwrap();
        acc.submit(&record_of_size(50)).unwrap();
        assert!(acc.sink().is_empty());
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn oversized_record_is_isolated() {
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 100);
        acc.submit(&record_of_size(30)).unwrap();
        acc.submit(&record_of_size(250)).unwrap();
        acc.submit(&record_of_size(30)).unwrap();

        let (sent, stats) = acc.finalize().unwrap();
        let batches = sent_records(&sent);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), [1, 1, 1]);
        assert_eq!(batches[1][0].encoded_len().unwrap(), 250);
        assert_eq!(stats.oversized, 1);
    }

    #[test]
    fn oversized_first_record_goes_alone() {
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 10);
        acc.submit(&record_of_size(20)).unwrap();
        assert!(acc.sink().is_empty());
        acc.submit(&record_of_size(20)).unwrap();
        assert_eq!(acc.sink().len(), 1);
    }

    #[test]
    fn finalize_on_empty_sends_nothing() {
        let acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 100);
        let (sent, stats) = acc.finalize().unwrap();
        assert!(sent.is_empty());
        assert_eq!(stats, BatchStats::default());
    }

    #[test]
    fn flush_on_empty_is_noop() {
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 100);
        acc.flush().unwrap();
        acc.flush().unwrap();
        assert!(acc.sink().is_empty());
    }

    #[test]
    fn order_is_preserved_across_batches() {
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), 64);
        let mut expected = Vec::new();
        for i in 0..50 {
            let mut record = Record::default();
            record.set(Field::Id, &i.to_string());
            record.set(Field::Title, &"t".repeat(i % 7));
            acc.submit(&record).unwrap();
            expected.push(record);
        }
        let (sent, _) = acc.finalize().unwrap();
        let flat: Vec<Record> = sent_records(&sent).into_iter().flatten().collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn multi_record_batches_respect_threshold() {
        let threshold = 64;
        let mut acc = BatchAccumulator::new(Vec::<Vec<u8>>::new(), threshold);
        for i in 0..40 {
            acc.submit(&record_of_size(10 + (i * 13) % 50)).unwrap();
        }
        let (sent, _) = acc.finalize().unwrap();
        for batch in sent_records(&sent) {
            let size: usize = batch.iter().map(|r| r.encoded_len().unwrap()).sum();
            assert!(batch.len() == 1 || size <= threshold, "{size} > {threshold}");
        }
    }

    #[test]
    fn sink_error_propagates_from_submit() {
        struct Failing;
        impl Sink for Failing {
            fn send(&mut self, _payload: &[u8]) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::ConnectionRefused, "down"))
            }
        }

        let mut acc = BatchAccumulator::new(Failing, 100);
        acc.submit(&record_of_size(60)).unwrap();
        let err = acc.submit(&record_of_size(60)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(acc.stats().batches, 0);
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.running_size(), 60);
    }

    #[test]
    fn sink_error_propagates_from_finalize() {
        struct Failing;
        impl Sink for Failing {
            fn send(&mut self, _payload: &[u8]) -> io::Result<()> {
                Err(io::Error::other("boom"))
            }
        }

        let mut acc = BatchAccumulator::new(Failing, 100);
        acc.submit(&record_of_size(20)).unwrap();
        assert!(acc.finalize().is_err());
    }
}
