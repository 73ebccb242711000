// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

use sagacity_core::CoreError;
use sagacity_token::AuthError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The failure taxonomy every boundary operation reports through.
///
/// Nothing here is retried; every call either succeeds or surfaces one of
/// these to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    /// Missing/invalid token, wrong issuer, or audience not granted.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Wrong top-level input shape; stored state is never touched.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A record in a merge batch was missing `data` or `target`; the whole
    /// batch was aborted.
    #[error("Invalid input: missing target")]
    BadFormat,

    /// The subject has no record in the addressed store.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Numeric/shape failure from the vectorizer or a model fit; fatal for
    /// this call.
    #[error(transparent)]
    Core(CoreError),

    /// The downstream training service reported a failure.
    #[error("training service: {0}")]
    Trainer(String),
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BadFormat => ServiceError::BadFormat,
            other => ServiceError::Core(other),
        }
    }
}
