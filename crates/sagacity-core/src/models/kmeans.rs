// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lloyd's k-means with k-means++ seeding.

use super::{check_rows, squared_distance};
use crate::error::{CoreError, CoreResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITER: usize = 300;
const TOL: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct KMeans {
    n_clusters: usize,
    seed: Option<u64>,
}

/// A completed clustering: per-row assignments and final centroids.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub centroids: Vec<Vec<f64>>,
    pub assignments: Vec<usize>,
    pub iterations: usize,
}

impl KMeansFit {
    /// Number of rows assigned to each cluster label.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centroids.len()];
        for &a in &self.assignments {
            sizes[a] += 1;
        }
        sizes
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            seed: None,
        }
    }

    /// Fixes the RNG seed; unseeded fits draw from entropy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn fit(&self, rows: &[Vec<f64>]) -> CoreResult<KMeansFit> {
        if self.n_clusters == 0 {
            return Err(CoreError::InvalidArgument(
                "n_clusters must be >= 1".to_string(),
            ));
        }
        check_rows(rows)?;
        if rows.len() < self.n_clusters {
            return Err(CoreError::InvalidArgument(format!(
                "n_clusters={} exceeds {} samples",
                self.n_clusters,
                rows.len()
            )));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut centroids = plus_plus_init(rows, self.n_clusters, &mut rng);
        let mut assignments = vec![0usize; rows.len()];

        for iteration in 0..MAX_ITER {
            for (i, row) in rows.iter().enumerate() {
                assignments[i] = nearest(row, &centroids);
            }

            let mut shift: f64 = 0.0;
            for label in 0..centroids.len() {
                let members: Vec<&Vec<f64>> = rows
                    .iter()
                    .zip(assignments.iter())
                    .filter(|(_, &a)| a == label)
                    .map(|(row, _)| row)
                    .collect();
                let next = if members.is_empty() {
                    // Reseed an emptied cluster from the row farthest from
                    // its current centroid.
                    farthest_row(rows, &centroids, &assignments).to_vec()
                } else {
                    mean(&members)
                };
                shift = shift.max(squared_distance(&centroids[label], &next));
                centroids[label] = next;
            }

            if shift < TOL {
                return Ok(KMeansFit {
                    centroids,
                    assignments,
                    iterations: iteration + 1,
                });
            }
        }

        for (i, row) in rows.iter().enumerate() {
            assignments[i] = nearest(row, &centroids);
        }
        Ok(KMeansFit {
            centroids,
            assignments,
            iterations: MAX_ITER,
        })
    }
}

fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (label, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best_dist {
            best = label;
            best_dist = d;
        }
    }
    best
}

fn mean(members: &[&Vec<f64>]) -> Vec<f64> {
    let dim = members[0].len();
    let mut out = vec![0.0; dim];
    for row in members {
        for (acc, v) in out.iter_mut().zip(row.iter()) {
            *acc += v;
        }
    }
    let n = members.len() as f64;
    for acc in &mut out {
        *acc /= n;
    }
    out
}

fn farthest_row<'a>(
    rows: &'a [Vec<f64>],
    centroids: &[Vec<f64>],
    assignments: &[usize],
) -> &'a [f64] {
    let mut best = &rows[0];
    let mut best_dist = -1.0;
    for (row, &a) in rows.iter().zip(assignments.iter()) {
        let d = squared_distance(row, &centroids[a]);
        if d > best_dist {
            best = row;
            best_dist = d;
        }
    }
    best
}

/// k-means++ seeding: each subsequent centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen centroid.
fn plus_plus_init(rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    centroids.push(rows[rng.gen_range(0..rows.len())].clone());

    while centroids.len() < k {
        let weights: Vec<f64> = rows
            .iter()
            .map(|row| {
                centroids
                    .iter()
                    .map(|c| squared_distance(row, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // All remaining rows coincide with a centroid; pick arbitrarily.
            centroids.push(rows[rng.gen_range(0..rows.len())].clone());
            continue;
        }
        let mut draw = rng.gen::<f64>() * total;
        let mut chosen = rows.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            draw -= w;
            if draw <= 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(rows[chosen].clone());
    }
    centroids
}
