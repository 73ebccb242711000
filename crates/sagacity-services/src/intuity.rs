// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! The intuity service: keyed training matrices, fit-on-demand.
//!
//! A training write replaces the subject's matrix wholesale and immediately
//! produces the job-scoped report; no fitted model outlives the call.

use crate::error::{ServiceError, ServiceResult};
use crate::store::SubjectStore;
use sagacity_core::training::{
    predict, train_classification, train_clustering, ClusterFrequency, TrainingMatrix,
};
use sagacity_token::{validate, JobType, TokenPayload};
use serde::Serialize;
use serde_json::Value;

const AUDIENCE: &str = "intuity";

/// Report produced by a training write; serialized under the `accuracy`
/// key either way, which is the shape clients consume.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TrainReport {
    Accuracy(f64),
    ClusterFrequency(ClusterFrequency),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainResponse {
    pub records: usize,
    #[serde(rename = "accuracy")]
    pub report: TrainReport,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictResponse {
    pub prediction: Vec<i64>,
}

#[derive(Debug)]
pub struct IntuityService {
    secret: Vec<u8>,
    store: SubjectStore<TrainingMatrix>,
    clustering_seed: Option<u64>,
}

impl IntuityService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            store: SubjectStore::new(),
            clustering_seed: None,
        }
    }

    /// Pins the k-means seed; production fits draw from entropy.
    pub fn with_clustering_seed(mut self, seed: u64) -> Self {
        self.clustering_seed = Some(seed);
        self
    }

    fn auth(&self, token: Option<&str>) -> ServiceResult<TokenPayload> {
        Ok(validate(&self.secret, token, AUDIENCE)?)
    }

    /// Returns the stored `{data, target}` matrix for the token's subject.
    pub fn read(&self, token: Option<&str>) -> ServiceResult<TrainingMatrix> {
        let payload = self.auth(token)?;
        self.store
            .read(&payload.uuid, TrainingMatrix::clone)
            .ok_or(ServiceError::NotFound("Training"))
    }

    /// Training write dispatched on the token's job scope: clustering tokens
    /// get the cluster-frequency report, everything else the classification
    /// accuracy.
    pub fn train(&self, token: Option<&str>, body: &Value) -> ServiceResult<TrainResponse> {
        let payload = self.auth(token)?;
        let job_type = payload.job_type();
        tracing::debug!(subject = %payload.uuid, job_type = ?job_type, "received training request");
        self.write_and_report(&payload, body, job_type)
    }

    /// The classification-training operation the accumulator forwards to.
    pub fn train_classification(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> ServiceResult<TrainResponse> {
        let payload = self.auth(token)?;
        self.write_and_report(&payload, body, Some(JobType::Classification))
    }

    fn write_and_report(
        &self,
        payload: &TokenPayload,
        body: &Value,
        job_type: Option<JobType>,
    ) -> ServiceResult<TrainResponse> {
        let obj = body
            .as_object()
            .ok_or_else(|| ServiceError::Validation("dict expected".to_string()))?;
        let data = obj
            .get("data")
            .ok_or_else(|| ServiceError::Validation("'data' is required".to_string()))?;
        let target = obj
            .get("target")
            .ok_or_else(|| ServiceError::Validation("'target' is required".to_string()))?;
        let matrix = TrainingMatrix::new(parse_matrix(data)?, parse_targets(target)?)?;

        tracing::debug!(
            subject = %payload.uuid,
            rows = matrix.len(),
            cols = matrix.data.first().map(Vec::len).unwrap_or(0),
            "storing training matrix"
        );
        // The write replaces the matrix wholesale and sticks even when the
        // fit below fails.
        self.store.put(&payload.uuid, matrix.clone());

        let report = match job_type {
            Some(JobType::Clustering) => {
                TrainReport::ClusterFrequency(train_clustering(&matrix, self.clustering_seed)?)
            }
            _ => TrainReport::Accuracy(train_classification(&matrix)?),
        };
        Ok(TrainResponse {
            records: matrix.len(),
            report,
        })
    }

    /// Refits an SVC on the subject's full stored matrix and predicts codes
    /// for the supplied vector(s).
    pub fn predict(&self, token: Option<&str>, body: &Value) -> ServiceResult<PredictResponse> {
        let payload = self.auth(token)?;
        let obj = body
            .as_object()
            .ok_or_else(|| ServiceError::Validation("dict expected".to_string()))?;
        let data = obj
            .get("data")
            .ok_or_else(|| ServiceError::Validation("'data' is required".to_string()))?;
        let queries = parse_queries(data)?;

        let matrix = self
            .store
            .read(&payload.uuid, TrainingMatrix::clone)
            .ok_or(ServiceError::NotFound("Training"))?;
        tracing::debug!(
            subject = %payload.uuid,
            rows = matrix.len(),
            queries = queries.len(),
            "refitting for prediction"
        );
        let prediction = predict(&matrix, &queries)?;
        tracing::info!(subject = %payload.uuid, prediction = ?prediction, "prediction complete");
        Ok(PredictResponse { prediction })
    }
}

fn parse_number(v: &Value) -> ServiceResult<f64> {
    v.as_f64()
        .ok_or_else(|| ServiceError::Validation(format!("expected a number, got {v}")))
}

fn parse_vector(v: &Value) -> ServiceResult<Vec<f64>> {
    v.as_array()
        .ok_or_else(|| ServiceError::Validation(format!("expected a vector, got {v}")))?
        .iter()
        .map(parse_number)
        .collect()
}

fn parse_matrix(v: &Value) -> ServiceResult<Vec<Vec<f64>>> {
    v.as_array()
        .ok_or_else(|| ServiceError::Validation("'data' must be a matrix".to_string()))?
        .iter()
        .map(parse_vector)
        .collect()
}

fn parse_targets(v: &Value) -> ServiceResult<Vec<i64>> {
    v.as_array()
        .ok_or_else(|| ServiceError::Validation("'target' must be a sequence".to_string()))?
        .iter()
        .map(|t| {
            t.as_i64().ok_or_else(|| {
                ServiceError::Validation(format!("targets must be integer codes, got {t}"))
            })
        })
        .collect()
}

/// A single vector is promoted to a one-element batch.
fn parse_queries(v: &Value) -> ServiceResult<Vec<Vec<f64>>> {
    let items = v
        .as_array()
        .ok_or_else(|| ServiceError::Validation("'data' must be a vector or matrix".to_string()))?;
    match items.first() {
        Some(Value::Array(_)) => items.iter().map(parse_vector).collect(),
        _ => Ok(vec![parse_vector(v)?]),
    }
}
