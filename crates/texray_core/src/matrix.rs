//! Sparse angular redistribution matrix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maps (outgoing bin, incoming bin) to the fraction of rays from the
/// incoming bin that left through the outgoing bin.
///
/// Stored column by column since columns are what gets normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatteringMatrix {
    n_out: usize,
    n_in: usize,
    columns: Vec<BTreeMap<usize, f64>>,
}

impl ScatteringMatrix {
    /// An all-zero `n_out × n_in` matrix.
    pub fn new(n_out: usize, n_in: usize) -> Self {
        Self {
            n_out,
            n_in,
            columns: vec![BTreeMap::new(); n_in],
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_out, self.n_in)
    }

    /// Add `weight` to entry (`out`, `inc`). Out-of-range indices are ignored
    /// and reported as `false`.
    pub fn add(&mut self, out: usize, inc: usize, weight: f64) -> bool {
        if out >= self.n_out || inc >= self.n_in {
            return false;
        }
        *self.columns[inc].entry(out).or_insert(0.0) += weight;
        true
    }

    pub fn get(&self, out: usize, inc: usize) -> f64 {
        self.columns
            .get(inc)
            .and_then(|c| c.get(&out))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn column_sum(&self, inc: usize) -> f64 {
        self.columns.get(inc).map_or(0.0, |c| c.values().sum())
    }

    /// Scale every non-empty column to unit sum.
    pub fn normalize_columns(&mut self) {
        for column in &mut self.columns {
            let sum: f64 = column.values().sum();
            if sum > 0.0 {
                column.values_mut().for_each(|v| *v /= sum);
            }
        }
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.columns.iter().map(|c| c.len()).sum()
    }

    /// (out, in, value) triples in column-major order.
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        self.columns
            .iter()
            .enumerate()
            .flat_map(|(inc, c)| c.iter().map(move |(&out, &v)| (out, inc, v)))
            .collect()
    }

    /// Dense row-major copy.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.n_in]; self.n_out];
        for (out, inc, v) in self.triplets() {
            dense[out][inc] = v;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_columns() {
        let mut m = ScatteringMatrix::new(4, 2);
        m.add(0, 0, 3.0);
        m.add(3, 0, 1.0);

        m.normalize_columns();

        assert_eq!(m.get(0, 0), 0.75);
        assert_eq!(m.get(3, 0), 0.25);
        assert!((m.column_sum(0) - 1.0).abs() < 1e-12);
        // Empty column stays empty
        assert_eq!(m.column_sum(1), 0.0);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut m = ScatteringMatrix::new(2, 1);
        assert!(!m.add(2, 0, 1.0));
        assert!(!m.add(0, 1, 1.0));
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn test_accumulate_and_dense() {
        let mut a = ScatteringMatrix::new(3, 2);
        a.add(1, 0, 1.0);
        a.add(1, 0, 2.0);
        a.add(2, 1, 1.0);

        assert_eq!(a.triplets(), vec![(1, 0, 3.0), (2, 1, 1.0)]);
        let dense = a.to_dense();
        assert_eq!(dense[1][0], 3.0);
        assert_eq!(dense[2][1], 1.0);
        assert_eq!(dense[0][0], 0.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut m = ScatteringMatrix::new(3, 2);
        m.add(2, 1, 0.5);
        let json = serde_json::to_string(&m).unwrap();
        let back: ScatteringMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
