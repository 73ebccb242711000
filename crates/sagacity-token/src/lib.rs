// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! sagacity-token
//!
//! The capability-token contract shared by every Sagacity service: a signed
//! bearer credential carrying a subject id, a fixed issuer, and an audience
//! set restricting which services may accept it.
//!
//! Wire form: `base64url(payload JSON) "." base64url(HMAC-SHA256(secret, payload))`.
//! The payload is `{uuid, data, iss, aud}`; tokens carry no expiry, so a
//! token stays valid for the lifetime of the signing secret.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Issuer name stamped into every token.
pub const ISSUER: &str = "authority";

/// Audience set granted at issuance. Each service validates against its own
/// entry; `activity` is reserved for the reporting service.
pub const AUDIENCE: [&str; 4] = ["authority", "curiosity", "intuity", "activity"];

/// The closed set of job types a token may be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Classification,
    Clustering,
    Regression,
}

impl JobType {
    pub const ALL: [JobType; 3] = [
        JobType::Classification,
        JobType::Clustering,
        JobType::Regression,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            JobType::Classification => "classification",
            JobType::Clustering => "clustering",
            JobType::Regression => "regression",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.as_str() == s)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Signature verification failed")]
    InvalidSignature,
    #[error("Invalid issuer '{found}'")]
    InvalidIssuer { found: String },
    #[error("Audience '{expected}' not granted by token")]
    InvalidAudience { expected: String },
}

/// Decoded token payload.
///
/// `data` is the issuance request exactly as validated, so downstream
/// services can read the scoped `job_type` without re-parsing the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPayload {
    pub uuid: String,
    pub data: Value,
    pub iss: String,
    pub aud: Vec<String>,
}

impl TokenPayload {
    /// The job type this token was scoped to at issuance, if well-formed.
    pub fn job_type(&self) -> Option<JobType> {
        self.data
            .get("job_type")
            .and_then(Value::as_str)
            .and_then(JobType::parse)
    }
}

/// Result of an issuance request.
///
/// Schema failures are reported as a description rather than a hard error:
/// the authority answers rejected requests with the message body, preserving
/// the observed issuance contract.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueOutcome {
    Issued { subject: String, token: String },
    Rejected { message: String },
}

/// Validates an issuance request and, on success, mints a freshly scoped
/// token for a new subject.
pub fn issue(secret: &[u8], request: &Value) -> IssueOutcome {
    if let Err(message) = validate_issue_request(request) {
        return IssueOutcome::Rejected { message };
    }
    let payload = TokenPayload {
        uuid: fresh_subject(),
        data: request.clone(),
        iss: ISSUER.to_string(),
        aud: AUDIENCE.iter().map(|a| a.to_string()).collect(),
    };
    let subject = payload.uuid.clone();
    IssueOutcome::Issued {
        subject,
        token: encode(secret, &payload),
    }
}

/// Decodes and verifies a token, then checks issuer and audience scope.
///
/// A missing token is its own failure case; every other failure carries the
/// underlying decode/audience/issuer reason.
pub fn validate(
    secret: &[u8],
    token: Option<&str>,
    expected_audience: &str,
) -> Result<TokenPayload, AuthError> {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AuthError::MissingToken),
    };
    let payload = decode(secret, token)?;
    if payload.iss != ISSUER {
        return Err(AuthError::InvalidIssuer {
            found: payload.iss,
        });
    }
    if !payload.aud.iter().any(|a| a == expected_audience) {
        return Err(AuthError::InvalidAudience {
            expected: expected_audience.to_string(),
        });
    }
    Ok(payload)
}

/// Signs a payload into its wire form.
pub fn encode(secret: &[u8], payload: &TokenPayload) -> String {
    // Payload JSON is signed byte-for-byte as embedded, so no
    // canonicalization is needed at verification time.
    let body = serde_json::to_vec(payload).unwrap_or_default();
    let sig = hmac_sha256(secret, &body);
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(&body),
        URL_SAFE_NO_PAD.encode(sig)
    )
}

/// Verifies the signature and deserializes the payload.
pub fn decode(secret: &[u8], token: &str) -> Result<TokenPayload, AuthError> {
    let (body_b64, sig_b64) = token
        .split_once('.')
        .ok_or_else(|| AuthError::Malformed("expected two dot-separated segments".into()))?;
    let body = URL_SAFE_NO_PAD
        .decode(body_b64)
        .map_err(|e| AuthError::Malformed(format!("payload segment: {e}")))?;
    let provided = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|e| AuthError::Malformed(format!("signature segment: {e}")))?;
    let expected = hmac_sha256(secret, &body);
    if !constant_time_eq(&expected, &provided) {
        return Err(AuthError::InvalidSignature);
    }
    serde_json::from_slice(&body).map_err(|e| AuthError::Malformed(format!("payload JSON: {e}")))
}

/// Generates an opaque subject identifier (16 random bytes, hex).
pub fn fresh_subject() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn validate_issue_request(request: &Value) -> Result<(), String> {
    let Some(obj) = request.as_object() else {
        return Err(format!("{request} is not of type 'object'"));
    };
    let Some(job_type) = obj.get("job_type") else {
        return Err("'job_type' is a required property".to_string());
    };
    let ok = job_type
        .as_str()
        .and_then(JobType::parse)
        .is_some();
    if !ok {
        let allowed: Vec<String> = JobType::ALL
            .iter()
            .map(|j| format!("'{}'", j.as_str()))
            .collect();
        return Err(format!(
            "{job_type} is not one of [{}]",
            allowed.join(", ")
        ));
    }
    Ok(())
}

fn hmac_sha256(secret: &[u8], message: &[u8]) -> [u8; 32] {
    const BLOCK_SIZE: usize = 64;
    let mut key_block = [0u8; BLOCK_SIZE];
    if secret.len() > BLOCK_SIZE {
        let digest = Sha256::digest(secret);
        key_block[..digest.len()].copy_from_slice(&digest);
    } else {
        key_block[..secret.len()].copy_from_slice(secret);
    }

    let mut o_key_pad = [0u8; BLOCK_SIZE];
    let mut i_key_pad = [0u8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        o_key_pad[i] = key_block[i] ^ 0x5c;
        i_key_pad[i] = key_block[i] ^ 0x36;
    }

    let mut inner = Sha256::new();
    inner.update(i_key_pad);
    inner.update(message);
    let inner_hash = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(o_key_pad);
    outer.update(inner_hash);
    outer.finalize().into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (&x, &y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &[u8] = b"test-signing-secret";

    fn issued() -> (String, String) {
        match issue(SECRET, &json!({"job_type": "classification"})) {
            IssueOutcome::Issued { subject, token } => (subject, token),
            IssueOutcome::Rejected { message } => panic!("unexpected rejection: {message}"),
        }
    }

    #[test]
    fn issued_token_validates_against_all_four_audiences() {
        let (subject, token) = issued();
        for audience in AUDIENCE {
            let payload = validate(SECRET, Some(&token), audience).expect("audience granted");
            assert_eq!(payload.uuid, subject);
            assert_eq!(payload.iss, ISSUER);
        }
    }

    #[test]
    fn foreign_audience_is_rejected() {
        let (_, token) = issued();
        let err = validate(SECRET, Some(&token), "telemetry").unwrap_err();
        assert_eq!(
            err,
            AuthError::InvalidAudience {
                expected: "telemetry".to_string()
            }
        );
    }

    #[test]
    fn missing_and_empty_tokens_are_distinct_failures() {
        assert_eq!(
            validate(SECRET, None, "curiosity").unwrap_err(),
            AuthError::MissingToken
        );
        assert_eq!(
            validate(SECRET, Some(""), "curiosity").unwrap_err(),
            AuthError::MissingToken
        );
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let (_, token) = issued();
        let (body_b64, sig_b64) = token.split_once('.').unwrap();
        let mut body = URL_SAFE_NO_PAD.decode(body_b64).unwrap();
        let idx = body.len() / 2;
        body[idx] ^= 1;
        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(&body), sig_b64);
        assert_eq!(
            validate(SECRET, Some(&forged), "curiosity").unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let (_, token) = issued();
        assert_eq!(
            validate(b"other-secret", Some(&token), "curiosity").unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn issuance_requires_job_type() {
        let outcome = issue(SECRET, &json!({}));
        assert_eq!(
            outcome,
            IssueOutcome::Rejected {
                message: "'job_type' is a required property".to_string()
            }
        );
    }

    #[test]
    fn issuance_rejects_unknown_job_type_with_description() {
        let outcome = issue(SECRET, &json!({"job_type": "divination"}));
        let IssueOutcome::Rejected { message } = outcome else {
            panic!("expected rejection");
        };
        assert!(message.contains("is not one of"));
        assert!(message.contains("'classification'"));
    }

    #[test]
    fn issuance_rejects_non_object_request() {
        let outcome = issue(SECRET, &json!([1, 2, 3]));
        assert!(matches!(outcome, IssueOutcome::Rejected { .. }));
    }

    #[test]
    fn payload_round_trips_and_exposes_job_type() {
        let (_, token) = issued();
        let payload = decode(SECRET, &token).unwrap();
        assert_eq!(payload.job_type(), Some(JobType::Classification));
        assert_eq!(payload.aud, AUDIENCE.map(String::from).to_vec());
    }

    #[test]
    fn subjects_are_unique_per_issuance() {
        let (a, _) = issued();
        let (b, _) = issued();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
