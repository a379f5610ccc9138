//! Fixed-width, sentinel-terminated neighbor tables.
//!
//! Each pixel owns one row of `width` cells. A row lists the indices of
//! adjacent pixels and ends at the first [`SENTINEL`]; cells after it are
//! padding. A table sized for a full camera may be reused for a truncated
//! one, so decoding also drops indices at or above the active pixel count.

use crate::error::DataShapeError;
use serde::{Deserialize, Serialize};

/// Marks the logical end of a neighbor row.
pub const SENTINEL: i32 = -1;

/// Neighbor rows stored contiguously, every row exactly `width` cells long.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i32>>", into = "Vec<Vec<i32>>")]
pub struct NeighborTable {
    width: usize,
    cells: Vec<i32>,
}

impl NeighborTable {
    /// Builds a table from individual rows, which must all share one width.
    ///
    /// # Errors
    /// Returns [`DataShapeError::RaggedNeighborRows`] for the first row whose
    /// length differs from the first row's.
    pub fn from_rows<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self, DataShapeError> {
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let mut cells = Vec::with_capacity(width * rows.len());
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(DataShapeError::RaggedNeighborRows {
                    row: index,
                    len: row.len(),
                    width,
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self { width, cells })
    }

    /// Fixed number of cells per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of physical rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len().checked_div(self.width).unwrap_or(0)
    }

    /// Returns true if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw cells of row `index`, sentinel and padding included.
    pub fn row(&self, index: usize) -> Option<&[i32]> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.width;
        Some(&self.cells[start..start + self.width])
    }

    /// Iterates over raw rows.
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        (0..self.len()).filter_map(move |index| self.row(index))
    }

    /// Decodes the first `pixel_count` rows into trimmed adjacency lists.
    ///
    /// Callers check [`len`](Self::len) against `pixel_count` first; rows
    /// past the end of the table are never produced.
    ///
    /// # Errors
    /// Fails on the first malformed row (see [`decode_row`]).
    pub fn decode(&self, pixel_count: usize) -> Result<Vec<Vec<u32>>, DataShapeError> {
        self.rows()
            .take(pixel_count)
            .enumerate()
            .map(|(index, row)| decode_row(index, row, pixel_count))
            .collect()
    }
}

impl TryFrom<Vec<Vec<i32>>> for NeighborTable {
    type Error = DataShapeError;

    fn try_from(rows: Vec<Vec<i32>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<NeighborTable> for Vec<Vec<i32>> {
    fn from(table: NeighborTable) -> Self {
        table.rows().map(<[i32]>::to_vec).collect()
    }
}

/// Decodes one raw row into the neighbors that exist among `pixel_count`
/// active pixels.
///
/// Scans left to right and stops at the first [`SENTINEL`]. Indices outside
/// `[0, pixel_count)` are skipped, negative ones included; order and
/// duplicates are kept.
///
/// # Errors
/// Returns [`DataShapeError::MissingSentinel`] if the row has no sentinel.
pub fn decode_row(
    row_index: usize,
    row: &[i32],
    pixel_count: usize,
) -> Result<Vec<u32>, DataShapeError> {
    let mut neighbors = Vec::new();
    for &value in row {
        if value == SENTINEL {
            return Ok(neighbors);
        }
        match u32::try_from(value) {
            Ok(index) if (index as usize) < pixel_count => neighbors.push(index),
            Ok(_) => {}
            Err(_) => log::warn!("neighbor row {row_index}: skipping negative index {value}"),
        }
    }
    Err(DataShapeError::MissingSentinel {
        row: row_index,
        width: row.len(),
    })
}
