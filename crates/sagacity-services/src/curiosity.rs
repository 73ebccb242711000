// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! The curiosity service: accumulates labeled observations, drives the
//! vectorizer, and forwards numeric matrices to the trainer.

use crate::error::{ServiceError, ServiceResult};
use crate::intuity::{IntuityService, TrainReport};
use crate::store::SubjectStore;
use sagacity_core::labels::{encode_labels, label_map};
use sagacity_core::{CoreError, Observation};
use sagacity_token::validate;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const AUDIENCE: &str = "curiosity";

/// The curiosity-to-intuity seam. Implementations carry the caller's token
/// verbatim so the trainer applies its own audience check.
pub trait TrainerClient {
    /// Forwards a vectorized matrix to the trainer's classification-training
    /// operation and returns the reported accuracy.
    fn train_classification(
        &self,
        token: &str,
        data: &[Vec<f64>],
        target: &[i64],
    ) -> ServiceResult<f64>;

    /// Forwards aligned vectors to the trainer's predict operation.
    fn predict(&self, token: &str, vectors: &[Vec<f64>]) -> ServiceResult<Vec<i64>>;
}

/// In-process stand-in for the network hop between curiosity and intuity.
#[derive(Debug, Clone)]
pub struct LocalTrainer {
    intuity: Arc<IntuityService>,
}

impl LocalTrainer {
    pub fn new(intuity: Arc<IntuityService>) -> Self {
        Self { intuity }
    }
}

impl TrainerClient for LocalTrainer {
    fn train_classification(
        &self,
        token: &str,
        data: &[Vec<f64>],
        target: &[i64],
    ) -> ServiceResult<f64> {
        let body = json!({ "data": data, "target": target });
        let response = self
            .intuity
            .train_classification(Some(token), &body)
            .map_err(|e| ServiceError::Trainer(e.to_string()))?;
        match response.report {
            TrainReport::Accuracy(accuracy) => Ok(accuracy),
            TrainReport::ClusterFrequency(_) => Err(ServiceError::Trainer(
                "expected an accuracy report".to_string(),
            )),
        }
    }

    fn predict(&self, token: &str, vectors: &[Vec<f64>]) -> ServiceResult<Vec<i64>> {
        let body = json!({ "data": vectors });
        let response = self
            .intuity
            .predict(Some(token), &body)
            .map_err(|e| ServiceError::Trainer(e.to_string()))?;
        Ok(response.prediction)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccumulateResponse {
    pub records: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionResponse {
    pub answer: Vec<Value>,
}

#[derive(Debug)]
pub struct CuriosityService<C> {
    secret: Vec<u8>,
    store: SubjectStore<Observation>,
    trainer: C,
}

impl<C: TrainerClient> CuriosityService<C> {
    pub fn new(secret: impl Into<Vec<u8>>, trainer: C) -> Self {
        Self {
            secret: secret.into(),
            store: SubjectStore::new(),
            trainer,
        }
    }

    fn auth<'t>(&self, token: Option<&'t str>) -> ServiceResult<(String, &'t str)> {
        let payload = validate(&self.secret, token, AUDIENCE)?;
        // token is Some and non-empty once validation has passed.
        Ok((payload.uuid, token.unwrap_or_default()))
    }

    /// Returns the `{data, target}` pairs accumulated for the token's subject.
    pub fn read(&self, token: Option<&str>) -> ServiceResult<Vec<Value>> {
        let (subject, _) = self.auth(token)?;
        self.store
            .read(&subject, observation_pairs)
            .ok_or(ServiceError::NotFound("Observation"))
    }

    /// Merges a batch of labeled records, revectorizes the full record set,
    /// and forwards the matrix to the trainer. Blocks on the trainer's
    /// response.
    pub fn accumulate(
        &self,
        token: Option<&str>,
        content_type: &str,
        body: &Value,
    ) -> ServiceResult<AccumulateResponse> {
        let (subject, raw_token) = self.auth(token)?;
        tracing::debug!(subject = %subject, "received observation request");
        let items = body
            .as_array()
            .ok_or_else(|| ServiceError::Validation("list expected".to_string()))?;

        let (records, matrix, encoded) = self.store.mutate_or_create(
            &subject,
            || Observation::new(content_type),
            |observation, created| -> ServiceResult<(usize, Vec<Vec<f64>>, Vec<i64>)> {
                if created {
                    tracing::info!(subject = %subject, "new observation");
                } else {
                    tracing::info!(subject = %subject, records = observation.len(), "found observation");
                }
                observation.merge(items)?;
                let (matrix, encoded) = observation.vectorize_for_training()?;
                Ok((observation.len(), matrix, encoded))
            },
        )?;

        let accuracy = self
            .trainer
            .train_classification(raw_token, &matrix, &encoded)?;
        Ok(AccumulateResponse { records, accuracy })
    }

    /// Aligns one record (or a list) against the stored feature names,
    /// forwards to the trainer's predict operation, and maps the returned
    /// codes back to original label values.
    pub fn question(&self, token: Option<&str>, body: &Value) -> ServiceResult<QuestionResponse> {
        let (subject, raw_token) = self.auth(token)?;
        if !body.is_object() && !body.is_array() {
            return Err(ServiceError::Validation(
                "dict or list are expected".to_string(),
            ));
        }

        let (vectors, code_map) = self
            .store
            .read(&subject, |observation| {
                let vectors = observation.vectorize_for_question(body)?.into_batch();
                let encoded = encode_labels(&observation.labels)?;
                Ok::<_, ServiceError>((vectors, label_map(&observation.labels, &encoded)))
            })
            .ok_or(ServiceError::NotFound("Observation"))??;

        let codes = self.trainer.predict(raw_token, &vectors)?;
        let answer = codes
            .iter()
            .map(|code| {
                code_map.get(code).cloned().ok_or_else(|| {
                    ServiceError::Core(CoreError::InvalidArgument(format!(
                        "prediction code {code} has no label mapping"
                    )))
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;
        Ok(QuestionResponse { answer })
    }

    /// Removes the subject's observation; already-deleted subjects report
    /// `NotFound`.
    pub fn delete(&self, token: Option<&str>) -> ServiceResult<()> {
        let (subject, _) = self.auth(token)?;
        if self.store.remove(&subject) {
            tracing::info!(subject = %subject, "deleted observation");
            Ok(())
        } else {
            Err(ServiceError::NotFound("Observation"))
        }
    }
}

fn observation_pairs(observation: &Observation) -> Vec<Value> {
    observation
        .records
        .iter()
        .zip(observation.labels.iter())
        .map(|(data, target)| json!({ "data": data, "target": target }))
        .collect()
}
