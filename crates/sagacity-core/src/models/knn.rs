// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! k-nearest-neighbors classifier over borrowed training rows.

use super::{check_rows, squared_distance};
use crate::error::{CoreError, CoreResult};

/// A k-NN classifier borrowing its training data for the duration of one
/// evaluate call. The effective neighbor count is capped at the training-row
/// count so a one-row training slice still evaluates.
#[derive(Debug)]
pub struct KNearest<'a> {
    k: usize,
    dim: usize,
    rows: &'a [Vec<f64>],
    labels: &'a [i64],
}

impl<'a> KNearest<'a> {
    pub fn fit(k: usize, rows: &'a [Vec<f64>], labels: &'a [i64]) -> CoreResult<Self> {
        if k == 0 {
            return Err(CoreError::InvalidArgument("k must be >= 1".to_string()));
        }
        let dim = check_rows(rows)?;
        if rows.len() != labels.len() {
            return Err(CoreError::InvalidArgument(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        Ok(Self {
            k: k.min(rows.len()),
            dim,
            rows,
            labels,
        })
    }

    /// Majority vote over the k nearest rows; vote ties go to the smaller
    /// label code.
    pub fn predict(&self, query: &[f64]) -> CoreResult<i64> {
        if query.len() != self.dim {
            return Err(CoreError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }
        let mut ranked: Vec<(f64, i64)> = self
            .rows
            .iter()
            .zip(self.labels.iter())
            .map(|(row, &label)| (squared_distance(row, query), label))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        ranked.truncate(self.k);

        let mut votes: Vec<(i64, usize)> = Vec::new();
        for &(_, label) in &ranked {
            match votes.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => votes.push((label, 1)),
            }
        }
        votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(label, _)| label)
            .ok_or(CoreError::EmptyTrainingSet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_label_wins() {
        let rows = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![10.0, 11.0]];
        let labels = vec![0, 1, 1];
        let knn = KNearest::fit(2, &rows, &labels).unwrap();
        assert_eq!(knn.predict(&[9.0, 9.0]).unwrap(), 1);
        assert_eq!(knn.predict(&[1.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn vote_ties_prefer_the_smaller_code() {
        let rows = vec![vec![0.0], vec![10.0]];
        let labels = vec![1, 0];
        let knn = KNearest::fit(2, &rows, &labels).unwrap();
        // Both neighbors vote once each.
        assert_eq!(knn.predict(&[1.0]).unwrap(), 0);
    }

    #[test]
    fn k_is_capped_at_the_row_count() {
        let rows = vec![vec![5.0]];
        let labels = vec![7];
        let knn = KNearest::fit(2, &rows, &labels).unwrap();
        assert_eq!(knn.predict(&[100.0]).unwrap(), 7);
    }

    #[test]
    fn empty_training_data_is_an_error() {
        assert_eq!(
            KNearest::fit(2, &[], &[]).unwrap_err(),
            CoreError::EmptyTrainingSet
        );
    }

    #[test]
    fn query_dimension_is_checked() {
        let rows = vec![vec![0.0, 0.0]];
        let labels = vec![0];
        let knn = KNearest::fit(1, &rows, &labels).unwrap();
        assert_eq!(
            knn.predict(&[1.0]).unwrap_err(),
            CoreError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
    }
}
