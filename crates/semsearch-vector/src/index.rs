use rayon::prelude::*;
use std::cmp::Ordering;

use semsearch_core::error::IndexError;
use semsearch_core::types::Position;

use crate::distance::squared_l2;

/// Below this many rows the scan stays on the calling thread.
const PARALLEL_SCAN_MIN_ROWS: usize = 4096;

/// One search hit: a row position and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: Position,
    pub distance: f32,
}

/// Ascending distance, then ascending position. Positions are unique, so this
/// is a total order and unstable sorts give deterministic output.
fn rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then_with(|| a.position.cmp(&b.position))
}

/// Immutable flat index: `len` rows of `dim` floats in one buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dim: usize,
    len: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Builds an index from vectors that all share one dimension. The first
    /// vector fixes `D`, which must be at least 1; an empty input gives an
    /// empty index with `D = 0`.
    pub fn build<I, V>(vectors: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        let mut iter = vectors.into_iter();
        let Some(first) = iter.next() else { return Ok(Self::default()) };
        let first = first.as_ref();
        let dim = first.len();
        if dim == 0 {
            return Err(IndexError::ZeroDimension);
        }
        let (lower, _) = iter.size_hint();
        let mut data = Vec::with_capacity(dim * (lower + 1));
        data.extend_from_slice(first);
        let mut len = 1;
        for v in iter {
            let v = v.as_ref();
            if v.len() != dim {
                return Err(IndexError::DimensionMismatch { expected: dim, actual: v.len() });
            }
            data.extend_from_slice(v);
            len += 1;
        }
        Ok(Self { dim, len, data })
    }

    /// Assembles an index from a decoded buffer. `data.len()` must equal `len * dim`.
    pub(crate) fn from_parts(dim: usize, len: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), dim * len);
        Self { dim, len, data }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub(crate) fn as_flat(&self) -> &[f32] {
        &self.data
    }

    pub fn vector(&self, position: Position) -> Option<&[f32]> {
        (position < self.len).then(|| self.row(position))
    }

    fn row(&self, position: Position) -> &[f32] {
        let start = position * self.dim;
        &self.data[start..start + self.dim]
    }

    fn neighbor(&self, query: &[f32], position: Position) -> Neighbor {
        Neighbor { position, distance: squared_l2(query, self.row(position)) }
    }

    /// Exact k-nearest rows to `query`, at most `min(k, len)` of them, sorted
    /// by ascending distance with ties broken by ascending position.
    ///
    /// An empty index answers every query with no hits. Otherwise `query`
    /// must have exactly `dim` components.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if self.len == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        let k = k.min(self.len);
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Neighbor> = if self.len >= PARALLEL_SCAN_MIN_ROWS {
            (0..self.len).into_par_iter().map(|i| self.neighbor(query, i)).collect()
        } else {
            (0..self.len).map(|i| self.neighbor(query, i)).collect()
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank);
        Ok(scored)
    }
}
