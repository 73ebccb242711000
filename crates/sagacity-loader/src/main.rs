// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! Converts an Elasticsearch search export into a curiosity observation
//! batch: `[{"data": {...}, "target": ...}, ...]` on stdout.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use chrono::{NaiveDateTime, Timelike};
use clap::Parser;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const ES_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f+00:00";

#[derive(Debug, Parser)]
#[command(name = "sagacity-loader")]
#[command(about = "Convert an Elasticsearch export into an observation batch")]
struct Args {
    /// Path to the Elasticsearch search-export JSON file.
    file: PathBuf,

    /// Field to extract as the label; removed from the record data.
    #[arg(long)]
    target: String,

    /// Fields to keep; all non-target fields when omitted.
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,

    /// Cap on the number of hits converted.
    #[arg(long)]
    size: Option<usize>,

    #[arg(long, default_value = "info")]
    log: String,
}

#[derive(Debug, Error)]
enum LoaderError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("export is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export has no hits.hits array")]
    MissingHits,
    #[error("hit has no _source object")]
    MissingSource,
    #[error("record is missing field '{0}'")]
    MissingField(String),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(args.log.clone()))
        .init();

    let raw = std::fs::read_to_string(&args.file).map_err(|source| LoaderError::Read {
        path: args.file.clone(),
        source,
    })?;
    let observations = convert(&raw, &args.target, &args.features, args.size)?;
    tracing::info!(count = observations.len(), "converted observations");
    println!("{}", serde_json::to_string(&Value::Array(observations))?);
    Ok(())
}

/// Extracts `{data, target}` observations from an export body.
fn convert(
    raw: &str,
    target: &str,
    features: &[String],
    size: Option<usize>,
) -> Result<Vec<Value>, LoaderError> {
    let export: Value = serde_json::from_str(raw)?;
    let hits = export
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(Value::as_array)
        .ok_or(LoaderError::MissingHits)?;
    let hits = match size {
        Some(n) => &hits[..n.min(hits.len())],
        None => &hits[..],
    };

    let mut observations = Vec::with_capacity(hits.len());
    for hit in hits {
        let source = hit
            .get("_source")
            .and_then(Value::as_object)
            .ok_or(LoaderError::MissingSource)?;
        let label = source
            .get(target)
            .cloned()
            .ok_or_else(|| LoaderError::MissingField(target.to_string()))?;

        let data = if features.is_empty() {
            let mut data = source.clone();
            data.remove(target);
            data
        } else {
            let mut data = Map::new();
            for feature in features {
                let value = source
                    .get(feature)
                    .cloned()
                    .ok_or_else(|| LoaderError::MissingField(feature.clone()))?;
                data.insert(feature.clone(), hour_of_day(value));
            }
            data
        };
        observations.push(json!({ "data": data, "target": label }));
    }
    Ok(observations)
}

/// Replaces timestamp-shaped strings with their hour of day; anything else
/// passes through unchanged.
fn hour_of_day(value: Value) -> Value {
    if let Value::String(s) = &value {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, ES_TIMESTAMP_FORMAT) {
            return json!(ts.hour());
        }
    }
    value
}
