// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dict-style feature vectorization.
//!
//! Converts heterogeneous attribute maps into aligned dense numeric vectors.
//! Numeric and boolean attributes pass through as a column named by their
//! key; string attributes one-hot expand to a `key=value` column. Column
//! order is the sorted feature-name order, so two vectorization passes over
//! the same key set always agree on layout.

use crate::error::{CoreError, CoreResult};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// One raw observation record: attribute name to scalar value.
pub type Record = Map<String, Value>;

/// Separator between a categorical key and its value in a one-hot column name.
const ONE_HOT_SEP: char = '=';

/// Vectorizes a full record set from scratch.
///
/// Computes the union of feature names across all records and returns the
/// dense matrix together with the ordered names actually used. Rerun over
/// the entire accumulated record set whenever new data is merged; there is
/// no incremental update.
pub fn fit_vectorize(records: &[Record]) -> CoreResult<(Vec<Vec<f64>>, Vec<String>)> {
    if records.is_empty() {
        return Err(CoreError::EmptyTrainingSet);
    }
    let mut names = BTreeSet::new();
    let mut locals = Vec::with_capacity(records.len());
    for record in records {
        let local = feature_entries(record)?;
        names.extend(local.keys().cloned());
        locals.push(local);
    }
    let names: Vec<String> = names.into_iter().collect();
    let matrix = locals
        .into_iter()
        .map(|local| {
            names
                .iter()
                .map(|name| local.get(name).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();
    Ok((matrix, names))
}

/// Re-vectorizes a single record against a previously recorded column order.
///
/// The record is vectorized alone, then each stored name is looked up in the
/// fresh local feature map, substituting `0.0` when absent. Features present
/// in the record but unknown to `feature_names` are silently dropped. This
/// name-indexed realignment is what lets a prediction-time vector line up
/// with training-time vectors computed in a separate pass.
pub fn align(record: &Record, feature_names: &[String]) -> CoreResult<Vec<f64>> {
    let local = feature_entries(record)?;
    Ok(feature_names
        .iter()
        .map(|name| local.get(name).copied().unwrap_or(0.0))
        .collect())
}

fn feature_entries(record: &Record) -> CoreResult<BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    for (key, value) in record {
        match value {
            Value::Number(n) => {
                let v = n.as_f64().ok_or_else(|| {
                    CoreError::InvalidArgument(format!(
                        "attribute '{key}' is not representable as f64"
                    ))
                })?;
                out.insert(key.clone(), v);
            }
            Value::String(s) => {
                out.insert(format!("{key}{ONE_HOT_SEP}{s}"), 1.0);
            }
            Value::Bool(b) => {
                out.insert(key.clone(), if *b { 1.0 } else { 0.0 });
            }
            other => {
                return Err(CoreError::InvalidArgument(format!(
                    "attribute '{key}' must be a scalar, got {other}"
                )));
            }
        }
    }
    Ok(out)
}
