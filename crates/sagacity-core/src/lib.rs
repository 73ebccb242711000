// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! sagacity-core
//!
//! Domain logic for the Sagacity experimentation pipeline:
//! - dict-style feature vectorization with name-indexed alignment
//! - per-call label encoding (sort-rank codes, never cached)
//! - observation accumulation with atomic batch merges
//! - training-matrix semantics with stateless refit on every
//!   evaluate/predict call (k-NN evaluation, k-means clustering report,
//!   RBF SVC prediction)

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod error;
pub mod labels;
pub mod models;
pub mod observation;
pub mod training;
pub mod vectorizer;

pub use crate::error::{CoreError, CoreResult};
pub use crate::observation::{Observation, QuestionVectors};
pub use crate::training::TrainingMatrix;
pub use crate::vectorizer::Record;
