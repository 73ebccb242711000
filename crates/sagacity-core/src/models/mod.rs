// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed model implementations.
//!
//! Algorithm choices are part of the service contract, not pluggable:
//! k-nearest-neighbors for training-time evaluation, k-means for the
//! clustering report, and an RBF-kernel support-vector classifier for
//! prediction. Every model is fit from scratch on each call; nothing here
//! persists a fitted estimator.

mod kmeans;
mod knn;
mod svc;

pub use kmeans::{KMeans, KMeansFit};
pub use knn::KNearest;
pub use svc::Svc;

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

pub(crate) fn check_rows(rows: &[Vec<f64>]) -> crate::error::CoreResult<usize> {
    use crate::error::CoreError;
    let Some(first) = rows.first() else {
        return Err(CoreError::EmptyTrainingSet);
    };
    let dim = first.len();
    for row in rows {
        if row.len() != dim {
            return Err(CoreError::DimensionMismatch {
                expected: dim,
                got: row.len(),
            });
        }
    }
    Ok(dim)
}
