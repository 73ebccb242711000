// Copyright (c) 2026 Sagacity Contributors
// SPDX-License-Identifier: Apache-2.0

//! sagacity-services
//!
//! The three pipeline services as transport-agnostic libraries:
//! - authority: issues and introspects capability tokens
//! - curiosity: accumulates labeled observations and drives the vectorizer
//! - intuity: stores training matrices and fits models on demand
//!
//! Routing, request parsing, and the curiosity-to-intuity network hop are
//! delegated to whatever hosts these services; [`curiosity::LocalTrainer`]
//! stands in for that hop in-process.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod authority;
pub mod curiosity;
pub mod error;
pub mod intuity;
pub mod store;

pub use crate::authority::AuthorityService;
pub use crate::curiosity::{
    AccumulateResponse, CuriosityService, LocalTrainer, QuestionResponse, TrainerClient,
};
pub use crate::error::{ServiceError, ServiceResult};
pub use crate::intuity::{IntuityService, PredictResponse, TrainReport, TrainResponse};
pub use crate::store::SubjectStore;
