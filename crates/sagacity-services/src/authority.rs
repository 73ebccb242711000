// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! The authority service: issues and introspects capability tokens.

use crate::error::ServiceResult;
use sagacity_token::{issue, validate, IssueOutcome, TokenPayload};
use serde_json::Value;

const AUDIENCE: &str = "authority";

#[derive(Debug)]
pub struct AuthorityService {
    secret: Vec<u8>,
}

impl AuthorityService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issues a token scoped to the requested job type.
    ///
    /// Schema failures come back as `IssueOutcome::Rejected` with the
    /// validation message; the request itself is not treated as an error.
    pub fn issue(&self, request: &Value) -> IssueOutcome {
        let outcome = issue(&self.secret, request);
        match &outcome {
            IssueOutcome::Issued { subject, .. } => {
                tracing::info!(subject = %subject, "issued capability token");
            }
            IssueOutcome::Rejected { message } => {
                tracing::debug!(message = %message, "rejected issuance request");
            }
        }
        outcome
    }

    /// Decodes a token presented back to the authority itself.
    pub fn introspect(&self, token: Option<&str>) -> ServiceResult<TokenPayload> {
        Ok(validate(&self.secret, token, AUDIENCE)?)
    }
}
