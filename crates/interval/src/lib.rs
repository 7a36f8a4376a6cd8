//! # Interval index
//!
//! An in-memory, ordered map from packet identifier runs to byte ranges of the
//! backing file.
//!
//! Every accepted payload lives in the backing file at the position its
//! identifier would occupy if packets had arrived sorted. The file itself
//! carries no framing, so this index is the only record of which bytes belong
//! to which identifiers.
//!
//! ## Key properties
//! - **Sorted order**: intervals are kept ascending by `start_id` in a `Vec`.
//! - **Maximal runs**: identifier-adjacent runs are always merged, so no two
//!   intervals touch.
//! - **Implicit start offsets**: an interval stores only its exclusive
//!   `end_offset`; its start is the previous interval's end (or 0).
//! - **Two-phase insert**: [`IntervalIndex::locate`] is a read-only query and
//!   [`IntervalIndex::commit`] applies the mutation once the caller has written
//!   the bytes.
//!
//! Once runs merge, the byte boundaries of the individual identifiers inside
//! them are gone. Only the aggregate run boundary is recoverable.
//!
//! `commit` shifts every interval after the insertion point, which is linear
//! in the number of intervals. That is fine while interval counts stay within
//! the `u16` identifier space; an order-statistics tree would be the next step
//! if profiling ever says otherwise.
//!
//! ## Example
//! ```rust
//! use interval::IntervalIndex;
//!
//! let mut index = IntervalIndex::new();
//! let k = index.locate(7).unwrap();
//! assert_eq!(index.insertion_offset(k), 0);
//! index.commit(7, 3, k);
//!
//! let k = index.locate(8).unwrap();
//! assert_eq!(index.insertion_offset(k), 3);
//! index.commit(8, 2, k);
//!
//! assert_eq!(index.len(), 1);
//! assert_eq!(index.total_len(), 5);
//! assert!(index.locate(7).is_err());
//! ```

use std::ops::Range;

use thiserror::Error;

/// A maximal run of identifiers stored contiguously in the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Smallest identifier in the run.
    pub start_id: u16,
    /// Largest identifier in the run.
    pub end_id: u16,
    /// Exclusive byte offset where this run's data ends in the file.
    pub end_offset: u64,
}

impl Interval {
    /// Returns `true` if `id` falls within `start_id..=end_id`.
    pub fn contains(&self, id: u16) -> bool {
        self.start_id <= id && id <= self.end_id
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("identifier {id} is already stored")]
    DuplicateIdentifier { id: u16 },
}

/// Ordered set of non-overlapping, non-adjacent identifier intervals.
#[derive(Debug, Default, Clone)]
pub struct IntervalIndex {
    intervals: Vec<Interval>,
}

impl IntervalIndex {
    /// Creates a new, empty index.
    pub fn new() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }

    /// Finds the position `k` where a run for `id` belongs.
    ///
    /// Every interval before `k` has `start_id < id`; every interval from `k`
    /// onward has `start_id > id`. The index is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateIdentifier`] if `id` equals some
    /// interval's `start_id`, or lies anywhere inside the run of the interval
    /// just before `k`.
    pub fn locate(&self, id: u16) -> Result<usize, IndexError> {
        let k = self.intervals.partition_point(|iv| iv.start_id < id);

        if let Some(next) = self.intervals.get(k) {
            if next.start_id == id {
                return Err(IndexError::DuplicateIdentifier { id });
            }
        }
        if k > 0 && self.intervals[k - 1].contains(id) {
            return Err(IndexError::DuplicateIdentifier { id });
        }

        Ok(k)
    }

    /// Byte offset at which the payload for a run at position `k` must be
    /// written: 0 for the first position, else the end of interval `k - 1`.
    pub fn insertion_offset(&self, k: usize) -> u64 {
        match k {
            0 => 0,
            _ => self.intervals[k - 1].end_offset,
        }
    }

    /// Records that `payload_size` bytes for `id` were written at
    /// [`insertion_offset(k)`](IntervalIndex::insertion_offset).
    ///
    /// `k` must come from a [`locate`](IntervalIndex::locate) call on the
    /// unchanged index. The new identifier either starts a fresh interval,
    /// extends its left or right neighbour, or bridges the two into one.
    /// Every interval after the affected one is then shifted by
    /// `payload_size`, since its bytes moved right in the file.
    pub fn commit(&mut self, id: u16, payload_size: u64, k: usize) {
        let n = self.intervals.len();
        debug_assert!(k <= n, "commit position {k} past end ({n})");

        let left = k > 0 && self.intervals[k - 1].end_id.checked_add(1) == Some(id);
        let right = k < n && id.checked_add(1) == Some(self.intervals[k].start_id);

        // position of the interval that now holds `id`
        let affected = match (left, right) {
            (false, false) => {
                let end_offset = self.insertion_offset(k) + payload_size;
                self.intervals.insert(
                    k,
                    Interval {
                        start_id: id,
                        end_id: id,
                        end_offset,
                    },
                );
                k
            }
            (true, false) => {
                let iv = &mut self.intervals[k - 1];
                iv.end_id = id;
                iv.end_offset += payload_size;
                k - 1
            }
            (false, true) => {
                let iv = &mut self.intervals[k];
                iv.start_id = id;
                iv.end_offset += payload_size;
                k
            }
            (true, true) => {
                let start_id = self.intervals[k - 1].start_id;
                let iv = &mut self.intervals[k];
                iv.start_id = start_id;
                iv.end_offset += payload_size;
                self.intervals.remove(k - 1);
                k - 1
            }
        };

        for iv in &mut self.intervals[affected + 1..] {
            iv.end_offset += payload_size;
        }
    }

    /// Returns the number of intervals (not identifiers).
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns `true` if no identifier has been committed.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total number of payload bytes tracked, i.e. the expected length of
    /// the backing file.
    pub fn total_len(&self) -> u64 {
        self.intervals.last().map_or(0, |iv| iv.end_offset)
    }

    /// Returns the interval at position `k`.
    pub fn get(&self, k: usize) -> Option<&Interval> {
        self.intervals.get(k)
    }

    /// Byte range of the run at position `k`.
    pub fn byte_range(&self, k: usize) -> Option<Range<u64>> {
        let iv = self.intervals.get(k)?;
        Some(self.insertion_offset(k)..iv.end_offset)
    }

    /// Finds the run holding `id`, returning the interval and its byte range.
    pub fn run_containing(&self, id: u16) -> Option<(Interval, Range<u64>)> {
        let k = self.intervals.partition_point(|iv| iv.start_id <= id);
        if k == 0 {
            return None;
        }
        let iv = self.intervals[k - 1];
        iv.contains(id)
            .then(|| (iv, self.insertion_offset(k - 1)..iv.end_offset))
    }

    /// Iterates over intervals in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }
}
