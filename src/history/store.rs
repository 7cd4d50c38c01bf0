use std::collections::VecDeque;

use tracing::{debug, info};

use super::structs::StoredRecord;
use crate::accumulator::HistoricalRecord;
use crate::common::InvariantViolation;
use crate::volume_profile::PeakRange;

/// Bounded FIFO of completed profiles.
///
/// Peaks of all records share one contiguous buffer; each record holds the offset and length
/// of its slice. Eviction removes the oldest record, its leading peaks and shifts every
/// remaining offset in a single step.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    records: VecDeque<StoredRecord>,
    peaks: Vec<PeakRange>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity + 1),
            peaks: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total peaks held across all records
    pub fn peak_len(&self) -> usize {
        self.peaks.len()
    }

    /// Push the record's metadata and append its peaks to the flattened buffer
    pub fn append(&mut self, record: HistoricalRecord) {
        let stored = StoredRecord {
            start_bar: record.start_bar,
            end_bar: record.end_bar,
            peak_start: self.peaks.len(),
            peak_count: record.peaks.len(),
            summary: record.summary,
        };
        self.peaks.extend(record.peaks);
        debug!(
            "Stored record [{}, {}] with {} peaks at offset {}",
            stored.start_bar, stored.end_bar, stored.peak_count, stored.peak_start
        );
        self.records.push_back(stored);
    }

    /// Evict oldest records until the store fits its capacity; returns how many were removed
    pub fn evict_if_over_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.records.len() > self.capacity {
            if !self.evict_oldest() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            info!("🗑️ Evicted {} historical profile(s), {} retained", evicted, self.records.len());
        }
        evicted
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(oldest) = self.records.pop_front() else {
            return false;
        };
        let count = oldest.peak_count.min(self.peaks.len());
        self.peaks.drain(..count);
        for record in self.records.iter_mut() {
            record.peak_start -= count;
        }
        true
    }

    /// Peaks of the record at `index` (0 = oldest); empty when out of range
    pub fn get_peaks(&self, index: usize) -> &[PeakRange] {
        self.records
            .get(index)
            .and_then(|r| self.peaks.get(r.peak_start..r.peak_start + r.peak_count))
            .unwrap_or(&[])
    }

    pub fn get(&self, index: usize) -> Option<&StoredRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter()
    }

    /// Rebuild the record at `index` with its peaks
    pub fn record(&self, index: usize) -> Option<HistoricalRecord> {
        let stored = self.records.get(index)?;
        Some(HistoricalRecord {
            start_bar: stored.start_bar,
            end_bar: stored.end_bar,
            peaks: self.get_peaks(index).to_vec(),
            summary: stored.summary.clone(),
        })
    }

    pub fn records(&self) -> Vec<HistoricalRecord> {
        (0..self.records.len()).filter_map(|i| self.record(i)).collect()
    }

    /// Check that record offsets tile the flattened peak buffer exactly
    pub fn verify_index_table(&self) -> Result<(), InvariantViolation> {
        if self.records.len() > self.capacity {
            return Err(InvariantViolation::CapacityExceeded {
                size: self.records.len(),
                capacity: self.capacity,
            });
        }

        let mut expected = 0;
        for (index, record) in self.records.iter().enumerate() {
            if record.peak_start != expected {
                return Err(InvariantViolation::PeakIndexMisaligned {
                    record: index,
                    expected,
                    actual: record.peak_start,
                });
            }
            expected += record.peak_count;
        }

        if expected != self.peaks.len() {
            return Err(InvariantViolation::PeakTableLength {
                covered: expected,
                stored: self.peaks.len(),
            });
        }
        Ok(())
    }
}
