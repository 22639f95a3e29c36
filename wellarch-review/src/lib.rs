//! Well-Architected review evaluation engine.
//!
//! This crate provides:
//! - Resilient invocation of the remote review API with classified retries
//! - Question retrieval by workload, category or single-question scope
//! - Risk derivation, resource enrichment and improvement planning
//! - Confidence scoring of AI-produced answers
//! - Milestone comparison
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    ReviewEngine                       │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────┐  │
//! │  │   Scope    │  │   Risks &  │  │   Milestone    │  │
//! │  │  Resolver  │  │    Plans   │  │    Differ      │  │
//! │  └─────┬──────┘  └─────┬──────┘  └───────┬────────┘  │
//! │        └───────────────┼─────────────────┘           │
//! │                        ▼                             │
//! │                 Invoker (retry)                      │
//! └────────────────────────┬─────────────────────────────┘
//!                          ▼
//!        ReviewApi (remote)      QuestionEvaluator (AI)
//! ```

mod confidence;
mod config;
mod engine;
mod error;
mod evaluator;
mod milestone;
mod observer;
mod retry;
mod risk;
mod scope;
mod types;
mod workload;

pub mod api;

pub use confidence::{ConfidenceFactors, score};
pub use config::{CONFIG_ENV_VAR, DEFAULT_DOCS_BASE_URL, DEFAULT_LENS_ALIAS, ReviewConfig};
pub use engine::ReviewEngine;
pub use error::{Error, Result};
pub use evaluator::{EvaluatorError, QuestionEvaluator};
pub use milestone::compare_snapshots;
pub use observer::{RecordingObserver, ReviewEvent, ReviewObserver, TracingObserver};
pub use retry::{ErrorClass, Invoker, RetryConfig, classify};
pub use risk::{
    best_practice_url, build_improvement_plan, build_improvement_plan_with_docs,
    enhance_with_resources, estimated_effort, priority, relevant_type_prefixes, risk_from_answer,
};
pub use scope::question_from_answer;
pub use types::{
    BestPractice, Category, Choice, Effort, Evaluation, Evidence, ImprovementPlanItem,
    MilestoneComparison, MilestoneSnapshot, Question, Risk, Scope, ScopeLevel, Severity,
};
pub use workload::{Resource, ResourceAddress, SourceType, WorkloadModel};
