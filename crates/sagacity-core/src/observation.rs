// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Accumulated labeled records for one experiment subject.

use crate::error::{CoreError, CoreResult};
use crate::labels::encode_labels;
use crate::vectorizer::{align, fit_vectorize, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The accumulated observation state for a subject.
///
/// `records` and `labels` stay the same length at all times.
/// `feature_names` is written only by a training-time vectorization pass,
/// never by an alignment pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub records: Vec<Record>,
    pub labels: Vec<Value>,
    pub feature_names: Vec<String>,
    pub content_type: String,
}

/// Aligned vectors for a question, preserving the caller's input shape.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionVectors {
    Single(Vec<f64>),
    Batch(Vec<Vec<f64>>),
}

impl QuestionVectors {
    /// Promotes a single vector to a one-element batch.
    pub fn into_batch(self) -> Vec<Vec<f64>> {
        match self {
            QuestionVectors::Single(v) => vec![v],
            QuestionVectors::Batch(vs) => vs,
        }
    }
}

impl Observation {
    pub fn new(content_type: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            ..Self::default()
        }
    }

    /// Appends a batch of `{data, target}` items.
    ///
    /// The whole batch is staged before anything is appended: an item
    /// missing either key (or whose `data` is not an attribute map) aborts
    /// the merge with `BadFormat` and leaves prior state untouched.
    pub fn merge(&mut self, items: &[Value]) -> CoreResult<()> {
        let mut new_records = Vec::with_capacity(items.len());
        let mut new_labels = Vec::with_capacity(items.len());
        for item in items {
            let obj = item.as_object().ok_or(CoreError::BadFormat)?;
            let data = obj
                .get("data")
                .and_then(Value::as_object)
                .ok_or(CoreError::BadFormat)?;
            let target = obj.get("target").ok_or(CoreError::BadFormat)?;
            new_records.push(data.clone());
            new_labels.push(target.clone());
        }
        self.records.extend(new_records);
        self.labels.extend(new_labels);
        Ok(())
    }

    /// Vectorizes the full record set, records the resulting feature names,
    /// and encodes the full label sequence.
    pub fn vectorize_for_training(&mut self) -> CoreResult<(Vec<Vec<f64>>, Vec<i64>)> {
        let (matrix, names) = fit_vectorize(&self.records)?;
        self.feature_names = names;
        let encoded = encode_labels(&self.labels)?;
        Ok((matrix, encoded))
    }

    /// Aligns one record or a sequence of records against the feature names
    /// recorded by the last training-time vectorization.
    pub fn vectorize_for_question(&self, input: &Value) -> CoreResult<QuestionVectors> {
        match input {
            Value::Object(record) => {
                Ok(QuestionVectors::Single(align(record, &self.feature_names)?))
            }
            Value::Array(items) => {
                let vectors = items
                    .iter()
                    .map(|item| {
                        let record = item.as_object().ok_or_else(|| {
                            CoreError::InvalidArgument(
                                "question items must be attribute maps".into(),
                            )
                        })?;
                        align(record, &self.feature_names)
                    })
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(QuestionVectors::Batch(vectors))
            }
            other => Err(CoreError::InvalidArgument(format!(
                "question must be a map or a sequence of maps, got {other}"
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
