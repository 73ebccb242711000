// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Label encoding.
//!
//! Codes are the sort ranks of the distinct labels present in the sequence,
//! recomputed from the full sequence on every call and never cached. Code
//! assignment is therefore only stable while the *set* of distinct labels
//! does not change: introducing a new label value between model fit and
//! prediction-label decoding silently shifts the codes, so callers must hold
//! the label set fixed across a fit/decode pair.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Assigns integer codes by sorting the current distinct label set and
/// mapping each label to its sort rank.
pub fn encode_labels(labels: &[Value]) -> CoreResult<Vec<i64>> {
    let mut distinct: Vec<&Value> = Vec::new();
    for label in labels {
        ensure_scalar(label)?;
        if !distinct.iter().any(|d| *d == label) {
            distinct.push(label);
        }
    }
    distinct.sort_by(|a, b| label_cmp(a, b));
    labels
        .iter()
        .map(|label| {
            distinct
                .iter()
                .position(|d| *d == label)
                .map(|rank| rank as i64)
                .ok_or_else(|| CoreError::InvalidArgument("label vanished during encoding".into()))
        })
        .collect()
}

/// Builds the code-to-label mapping by pairing `encoded[i]` with `labels[i]`.
///
/// Position correspondence is valid because encoding is order-preserving
/// within a single call; later pairs overwrite earlier ones with the same
/// value.
pub fn label_map(labels: &[Value], encoded: &[i64]) -> HashMap<i64, Value> {
    encoded
        .iter()
        .zip(labels.iter())
        .map(|(code, label)| (*code, label.clone()))
        .collect()
}

fn ensure_scalar(label: &Value) -> CoreResult<()> {
    match label {
        Value::Array(_) | Value::Object(_) => Err(CoreError::InvalidArgument(format!(
            "label must be a JSON scalar, got {label}"
        ))),
        _ => Ok(()),
    }
}

/// Total order over scalar labels: null < bool < number < string.
fn label_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
