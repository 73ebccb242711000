// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("record is missing 'data' or 'target'")]
    BadFormat,

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("evaluation set is empty")]
    EmptyEvaluationSet,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
