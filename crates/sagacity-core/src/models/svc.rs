// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! RBF-kernel support-vector classifier.
//!
//! Binary machines are trained with the simplified SMO procedure and
//! combined one-vs-rest; the predicted class is the argmax of the per-class
//! decision functions f(x) = sum(alpha_i * y_i * k(x_i, x)) + b with
//! k(x, y) = exp(-gamma * ||x - y||^2).

use super::{check_rows, squared_distance};
use crate::error::{CoreError, CoreResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SMO_TOL: f64 = 1e-3;
const SMO_MIN_ALPHA_STEP: f64 = 1e-5;
const SMO_MAX_PASSES: usize = 8;
const SMO_MAX_SWEEPS: usize = 2_000;
const SMO_RNG_SEED: u64 = 0x5a6a;

#[derive(Debug, Clone)]
pub struct Svc {
    gamma: f64,
    c: f64,
}

/// One trained one-vs-rest machine: alpha_i * y_i per training row plus the
/// bias term.
#[derive(Debug, Clone)]
struct BinaryMachine {
    coef: Vec<f64>,
    bias: f64,
}

/// A fitted multi-class classifier borrowing its training rows.
#[derive(Debug)]
pub struct SvcFit<'a> {
    gamma: f64,
    dim: usize,
    rows: &'a [Vec<f64>],
    classes: Vec<i64>,
    machines: Vec<BinaryMachine>,
}

impl Svc {
    pub fn new(gamma: f64, c: f64) -> CoreResult<Self> {
        if !(gamma > 0.0) || !(c > 0.0) {
            return Err(CoreError::InvalidArgument(
                "gamma and C must be positive".to_string(),
            ));
        }
        Ok(Self { gamma, c })
    }

    pub fn fit<'a>(&self, rows: &'a [Vec<f64>], labels: &[i64]) -> CoreResult<SvcFit<'a>> {
        let dim = check_rows(rows)?;
        if rows.len() != labels.len() {
            return Err(CoreError::InvalidArgument(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let mut classes: Vec<i64> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(CoreError::InvalidArgument(
                "classifier needs at least two classes".to_string(),
            ));
        }

        let n = rows.len();
        let mut kernel = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let k = (-self.gamma * squared_distance(&rows[i], &rows[j])).exp();
                kernel[i][j] = k;
                kernel[j][i] = k;
            }
        }

        let machines = classes
            .iter()
            .map(|&class| {
                let y: Vec<f64> = labels
                    .iter()
                    .map(|&l| if l == class { 1.0 } else { -1.0 })
                    .collect();
                smo_train(&kernel, &y, self.c)
            })
            .collect();

        Ok(SvcFit {
            gamma: self.gamma,
            dim,
            rows,
            classes,
            machines,
        })
    }
}

impl SvcFit<'_> {
    /// Predicts the class label for one query vector.
    pub fn predict(&self, query: &[f64]) -> CoreResult<i64> {
        if query.len() != self.dim {
            return Err(CoreError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }
        let kernel_row: Vec<f64> = self
            .rows
            .iter()
            .map(|row| (-self.gamma * squared_distance(row, query)).exp())
            .collect();

        let mut best = self.classes[0];
        let mut best_score = f64::NEG_INFINITY;
        for (class, machine) in self.classes.iter().zip(self.machines.iter()) {
            let score: f64 = machine
                .coef
                .iter()
                .zip(kernel_row.iter())
                .map(|(c, k)| c * k)
                .sum::<f64>()
                + machine.bias;
            if score > best_score {
                best = *class;
                best_score = score;
            }
        }
        Ok(best)
    }

    pub fn predict_batch(&self, queries: &[Vec<f64>]) -> CoreResult<Vec<i64>> {
        queries.iter().map(|q| self.predict(q)).collect()
    }
}

/// Simplified SMO: sweep multipliers pairwise until no pair changes for
/// `SMO_MAX_PASSES` consecutive sweeps, with a hard sweep cap.
fn smo_train(kernel: &[Vec<f64>], y: &[f64], c: f64) -> BinaryMachine {
    let n = y.len();
    let mut alpha = vec![0.0f64; n];
    let mut bias = 0.0f64;
    let mut rng = StdRng::seed_from_u64(SMO_RNG_SEED);

    let decision = |alpha: &[f64], bias: f64, i: usize| -> f64 {
        (0..n).map(|t| alpha[t] * y[t] * kernel[t][i]).sum::<f64>() + bias
    };

    let mut quiet_passes = 0usize;
    let mut sweeps = 0usize;
    while quiet_passes < SMO_MAX_PASSES && sweeps < SMO_MAX_SWEEPS {
        sweeps += 1;
        let mut changed = 0usize;
        for i in 0..n {
            let err_i = decision(&alpha, bias, i) - y[i];
            let violates = (y[i] * err_i < -SMO_TOL && alpha[i] < c)
                || (y[i] * err_i > SMO_TOL && alpha[i] > 0.0);
            if !violates {
                continue;
            }
            let mut j = rng.gen_range(0..n - 1);
            if j >= i {
                j += 1;
            }
            let err_j = decision(&alpha, bias, j) - y[j];

            let (alpha_i_old, alpha_j_old) = (alpha[i], alpha[j]);
            let (low, high) = if (y[i] - y[j]).abs() > f64::EPSILON {
                let diff = alpha[j] - alpha[i];
                (diff.max(0.0), (c + diff).min(c))
            } else {
                let sum = alpha[i] + alpha[j];
                ((sum - c).max(0.0), sum.min(c))
            };
            if (high - low).abs() < f64::EPSILON {
                continue;
            }
            let eta = 2.0 * kernel[i][j] - kernel[i][i] - kernel[j][j];
            if eta >= 0.0 {
                continue;
            }
            let mut alpha_j = alpha[j] - y[j] * (err_i - err_j) / eta;
            alpha_j = alpha_j.clamp(low, high);
            if (alpha_j - alpha_j_old).abs() < SMO_MIN_ALPHA_STEP {
                continue;
            }
            let alpha_i = alpha[i] + y[i] * y[j] * (alpha_j_old - alpha_j);
            alpha[i] = alpha_i;
            alpha[j] = alpha_j;

            let b1 = bias
                - err_i
                - y[i] * (alpha_i - alpha_i_old) * kernel[i][i]
                - y[j] * (alpha_j - alpha_j_old) * kernel[i][j];
            let b2 = bias
                - err_j
                - y[i] * (alpha_i - alpha_i_old) * kernel[i][j]
                - y[j] * (alpha_j - alpha_j_old) * kernel[j][j];
            bias = if alpha_i > 0.0 && alpha_i < c {
                b1
            } else if alpha_j > 0.0 && alpha_j < c {
                b2
            } else {
                (b1 + b2) / 2.0
            };
            changed += 1;
        }
        if changed == 0 {
            quiet_passes += 1;
        } else {
            quiet_passes = 0;
        }
    }

    let coef = alpha.iter().zip(y.iter()).map(|(a, yy)| a * yy).collect();
    BinaryMachine { coef, bias }
}
