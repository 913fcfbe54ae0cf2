// Rectangular cell matrix used for table regions
use super::error::{SnapshotError, SnapshotResult};
use serde::{Deserialize, Serialize};

/// Row-major grid of raw cell strings.
///
/// Dimensions are stored explicitly so a region can have rows but no columns
/// (a table without a left header) or columns but no rows (no top header).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    columns: usize,
    cells: Vec<String>,
}

/// Stored form of a matrix, checked against its dimensions when loaded.
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    columns: usize,
    cells: Vec<String>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = SnapshotError;

    fn try_from(raw: RawMatrix) -> SnapshotResult<Self> {
        Matrix::from_cells(raw.rows, raw.columns, raw.cells)
    }
}

impl Matrix {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A matrix with the given shape and no cells, valid only when one side is zero.
    pub fn hollow(rows: usize, columns: usize) -> SnapshotResult<Self> {
        Self::from_cells(rows, columns, Vec::new())
    }

    pub fn from_cells(rows: usize, columns: usize, cells: Vec<String>) -> SnapshotResult<Self> {
        if rows.checked_mul(columns) != Some(cells.len()) {
            return Err(SnapshotError::MatrixShape {
                rows,
                columns,
                cells: cells.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    /// Builds a matrix from nested rows, copying every cell.
    pub fn from_rows<R: AsRef<[String]>>(rows: &[R]) -> SnapshotResult<Self> {
        let columns = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(rows.len() * columns);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != columns {
                return Err(SnapshotError::RaggedMarkup {
                    row: index,
                    expected: columns,
                    found: row.len(),
                });
            }
            cells.extend(row.iter().cloned());
        }
        Ok(Self {
            rows: rows.len(),
            columns,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column).map(String::as_str)
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.columns;
        Some(&self.cells[start..start + self.columns])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[String]> {
        (0..self.rows).filter_map(move |r| self.row(r))
    }

    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.iter_rows().map(<[String]>::to_vec).collect()
    }

    /// Copies the sub-grid `rows x columns`; both ranges must lie within the matrix.
    pub fn slice(
        &self,
        rows: std::ops::Range<usize>,
        columns: std::ops::Range<usize>,
    ) -> Matrix {
        let row_end = rows.end.min(self.rows);
        let column_end = columns.end.min(self.columns);
        let row_start = rows.start.min(row_end);
        let column_start = columns.start.min(column_end);

        let mut cells = Vec::new();
        for r in row_start..row_end {
            let base = r * self.columns;
            cells.extend_from_slice(&self.cells[base + column_start..base + column_end]);
        }
        Matrix {
            rows: row_end - row_start,
            columns: column_end - column_start,
            cells,
        }
    }
}
