// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline scenarios across the three services wired with the
//! in-process trainer client.

use std::sync::Arc;

use sagacity_services::{
    AuthorityService, CuriosityService, IntuityService, LocalTrainer, ServiceError, TrainReport,
};
use sagacity_token::{AuthError, IssueOutcome};
use serde_json::{json, Value};

const SECRET: &[u8] = b"pipeline-shared-secret";

struct Pipeline {
    authority: AuthorityService,
    curiosity: CuriosityService<LocalTrainer>,
    intuity: Arc<IntuityService>,
}

fn pipeline() -> Pipeline {
    let intuity = Arc::new(IntuityService::new(SECRET).with_clustering_seed(17));
    Pipeline {
        authority: AuthorityService::new(SECRET),
        curiosity: CuriosityService::new(SECRET, LocalTrainer::new(Arc::clone(&intuity))),
        intuity,
    }
}

fn issue(p: &Pipeline, job_type: &str) -> (String, String) {
    match p.authority.issue(&json!({ "job_type": job_type })) {
        IssueOutcome::Issued { subject, token } => (subject, token),
        IssueOutcome::Rejected { message } => panic!("issuance rejected: {message}"),
    }
}

fn labeled_batch(n: usize) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| {
            let target = if i % 2 == 0 { "a" } else { "b" };
            json!({ "data": { "x": i }, "target": target })
        })
        .collect();
    Value::Array(items)
}

#[test]
fn classification_lifecycle_end_to_end() {
    let p = pipeline();
    let (subject, token) = issue(&p, "classification");

    let payload = p.authority.introspect(Some(&token)).expect("introspect");
    assert_eq!(payload.uuid, subject);

    let resp = p
        .curiosity
        .accumulate(Some(&token), "application/json", &labeled_batch(10))
        .expect("accumulate");
    assert_eq!(resp.records, 10);
    assert!((0.0..=100.0).contains(&resp.accuracy));

    let pairs = p.curiosity.read(Some(&token)).expect("read");
    assert_eq!(pairs.len(), 10);
    assert_eq!(pairs[0]["data"]["x"], json!(0));
    assert_eq!(pairs[0]["target"], json!("a"));

    // The trainer holds the forwarded matrix under the same subject.
    let matrix = p.intuity.read(Some(&token)).expect("training read");
    assert_eq!(matrix.len(), 10);

    p.curiosity.delete(Some(&token)).expect("delete");
    assert_eq!(
        p.curiosity.read(Some(&token)).unwrap_err(),
        ServiceError::NotFound("Observation")
    );
    assert_eq!(
        p.curiosity.delete(Some(&token)).unwrap_err(),
        ServiceError::NotFound("Observation")
    );
}

#[test]
fn question_returns_original_label_values() {
    let p = pipeline();
    let (_, token) = issue(&p, "classification");

    let items: Vec<Value> = (0..5)
        .map(|i| json!({ "data": { "x": i }, "target": "small" }))
        .chain((100..105).map(|i| json!({ "data": { "x": i }, "target": "big" })))
        .collect();
    p.curiosity
        .accumulate(Some(&token), "application/json", &Value::Array(items))
        .expect("accumulate");

    let single = p
        .curiosity
        .question(Some(&token), &json!({ "x": 2 }))
        .expect("single question");
    assert_eq!(single.answer, vec![json!("small")]);

    let batch = p
        .curiosity
        .question(Some(&token), &json!([{ "x": 101 }, { "x": 3 }]))
        .expect("batch question");
    assert_eq!(batch.answer, vec![json!("big"), json!("small")]);
}

#[test]
fn question_aligns_against_recorded_feature_names() {
    let p = pipeline();
    let (_, token) = issue(&p, "classification");

    // Mixed numeric and categorical features; the query carries an unseen
    // feature that must be dropped and omits others that must default to 0.
    let items: Vec<Value> = (0..5)
        .map(|i| json!({ "data": { "x": i, "kind": "near" }, "target": "near" }))
        .chain((200..205).map(|i| json!({ "data": { "x": i, "kind": "far" }, "target": "far" })))
        .collect();
    p.curiosity
        .accumulate(Some(&token), "application/json", &Value::Array(items))
        .expect("accumulate");

    let resp = p
        .curiosity
        .question(Some(&token), &json!({ "x": 201, "unseen": 9 }))
        .expect("question");
    assert_eq!(resp.answer, vec![json!("far")]);
}

#[test]
fn clustering_token_reports_cluster_frequencies() {
    let p = pipeline();
    let (_, token) = issue(&p, "clustering");

    let body = json!({
        "data": [[0.0, 0.0], [0.2, 0.0], [0.0, 0.2], [8.0, 8.0], [8.2, 8.0], [8.0, 8.2]],
        "target": [0, 0, 0, 1, 1, 1],
    });
    let resp = p.intuity.train(Some(&token), &body).expect("train");
    assert_eq!(resp.records, 6);
    let TrainReport::ClusterFrequency(frequency) = resp.report else {
        panic!("expected a frequency report for a clustering token");
    };
    for k in ["2", "3", "5"] {
        assert_eq!(frequency[k].values().sum::<usize>(), 6);
    }
    let mut two: Vec<usize> = frequency["2"].values().copied().collect();
    two.sort_unstable();
    assert_eq!(two, vec![3, 3]);
}

#[test]
fn tokens_are_rejected_across_trust_domains() {
    let p = pipeline();
    let foreign = AuthorityService::new(b"some-other-secret".to_vec());
    let IssueOutcome::Issued { token, .. } = foreign.issue(&json!({"job_type": "classification"}))
    else {
        panic!("expected issuance");
    };

    assert_eq!(
        p.curiosity.read(Some(&token)).unwrap_err(),
        ServiceError::Auth(AuthError::InvalidSignature)
    );
    assert_eq!(
        p.intuity.read(Some(&token)).unwrap_err(),
        ServiceError::Auth(AuthError::InvalidSignature)
    );
    assert_eq!(
        p.curiosity.read(None).unwrap_err(),
        ServiceError::Auth(AuthError::MissingToken)
    );
}

#[test]
fn bad_format_batch_aborts_without_losing_state() {
    let p = pipeline();
    let (_, token) = issue(&p, "classification");

    p.curiosity
        .accumulate(Some(&token), "application/json", &labeled_batch(10))
        .expect("seed accumulate");
    let err = p
        .curiosity
        .accumulate(
            Some(&token),
            "application/json",
            &json!([
                { "data": { "x": 99 }, "target": "a" },
                { "data": { "x": 98 } },
            ]),
        )
        .unwrap_err();
    assert_eq!(err, ServiceError::BadFormat);
    assert_eq!(p.curiosity.read(Some(&token)).expect("read").len(), 10);
}

#[test]
fn prediction_without_training_matrix_is_not_found() {
    let p = pipeline();
    let (_, token) = issue(&p, "classification");
    let err = p
        .intuity
        .predict(Some(&token), &json!({ "data": [1.0, 2.0] }))
        .unwrap_err();
    assert_eq!(err, ServiceError::NotFound("Training"));
}
