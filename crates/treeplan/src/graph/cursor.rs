//! Single-pass cursor over one row's sorted column entries.

use crate::graph::sparse::ColEntry;

/// Monotonic cursor pairing a row's pending `(column, sign)` entries with
/// that row's previous-level 0/1 history.
///
/// Tree construction consumes entries strictly in column order, so every
/// range scan can stop at the first entry past its upper bound. A mismatched
/// or exhausted `add_edge` is a construction bug and panics.
pub struct ColumnCursor<'a> {
    entries: &'a [ColEntry],
    prev_row: &'a [u8],
    pos: usize,
}

impl<'a> ColumnCursor<'a> {
    pub fn new(entries: &'a [ColEntry], prev_row: &'a [u8]) -> Self {
        ColumnCursor {
            entries,
            prev_row,
            pos: 0,
        }
    }

    /// Consumes the entry under the cursor, which must hold exactly `col`;
    /// returns its nonzero sign.
    pub fn add_edge(&mut self, col: u32) -> i32 {
        assert!(
            self.pos < self.entries.len(),
            "cursor exhausted at column {col}"
        );
        let entry = self.entries[self.pos];
        assert_eq!(
            entry.col, col,
            "cursor holds column {}, add_edge asked for {col}",
            entry.col
        );
        assert_ne!(entry.sign, 0);
        self.pos += 1;
        entry.sign
    }

    /// Peeks the next pending column without consuming it.
    pub fn next_edge(&self) -> Option<u32> {
        self.entries.get(self.pos).map(|entry| entry.col)
    }

    /// Last column of the full slice, consumed or not; the bisection upper
    /// bound.
    pub fn last_edge(&self) -> Option<u32> {
        self.entries.last().map(|entry| entry.col)
    }

    /// True when some still-pending column falls in `[range_start, range_end)`.
    pub fn has_edge(&self, range_start: u32, range_end: u32) -> bool {
        for entry in &self.entries[self.pos..] {
            if entry.col >= range_start && entry.col < range_end {
                return true;
            }
            if entry.col >= range_end {
                break;
            }
        }
        false
    }

    /// Number of still-pending columns in `[range_start, range_end)`.
    pub fn num_edges(&self, range_start: u32, range_end: u32) -> u32 {
        let mut count = 0;
        for entry in &self.entries[self.pos..] {
            if entry.col >= range_end {
                break;
            }
            if entry.col >= range_start {
                count += 1;
            }
        }
        count
    }

    /// Whether the previous level already had an edge at this column.
    pub fn had_edge(&self, index: u32) -> bool {
        assert!(
            (index as usize) < self.prev_row.len(),
            "column {index} outside previous-adjacency history of {} entries",
            self.prev_row.len()
        );
        self.prev_row[index as usize] == 1
    }
}
