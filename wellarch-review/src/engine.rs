//! The review engine and its pass-through remote operations.
//!
//! [`ReviewEngine`] owns the collaborators and static configuration. Question
//! retrieval, risk derivation, evaluation and milestone comparison are
//! implemented in their own modules as further `impl ReviewEngine` blocks.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio_util::sync::CancellationToken;

use crate::api::{
    AnswerSummary, MilestoneRef, ReportFormat, ReviewApi, UpdateAnswerRequest, Workload,
    WorkloadSpec,
};
use crate::config::ReviewConfig;
use crate::error::{Error, Result};
use crate::evaluator::QuestionEvaluator;
use crate::observer::{ReviewObserver, TracingObserver};
use crate::retry::Invoker;
use crate::types::Evaluation;

/// Orchestrates a Well-Architected review against the remote review API.
///
/// The engine holds no per-request state; all methods take `&self` and can
/// run concurrently.
pub struct ReviewEngine {
    pub(crate) api: Arc<dyn ReviewApi>,
    pub(crate) evaluator: Option<Arc<dyn QuestionEvaluator>>,
    pub(crate) invoker: Invoker,
    pub(crate) observer: Arc<dyn ReviewObserver>,
    pub(crate) config: ReviewConfig,
}

impl ReviewEngine {
    /// Create an engine that logs through `tracing`.
    pub fn new(api: Arc<dyn ReviewApi>, config: ReviewConfig) -> Result<Self> {
        Self::with_observer(api, config, Arc::new(TracingObserver))
    }

    /// Create an engine that reports events to `observer`.
    pub fn with_observer(
        api: Arc<dyn ReviewApi>,
        config: ReviewConfig,
        observer: Arc<dyn ReviewObserver>,
    ) -> Result<Self> {
        config.validate()?;
        let invoker = Invoker::new(config.retry.clone(), observer.clone())?;
        Ok(Self {
            api,
            evaluator: None,
            invoker,
            observer,
            config,
        })
    }

    /// Attach the AI evaluator used by [`evaluate_question`](Self::evaluate_question).
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn QuestionEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Register a workload with the remote service.
    pub async fn create_workload(
        &self,
        spec: &WorkloadSpec,
        cancel: &CancellationToken,
    ) -> Result<Workload> {
        self.invoker
            .invoke("CreateWorkload", cancel, || self.api.create_workload(spec))
            .await
    }

    /// Fetch a workload.
    pub async fn get_workload(
        &self,
        workload_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Workload> {
        require_workload_id(workload_id)?;
        self.invoker
            .invoke("GetWorkload", cancel, || self.api.get_workload(workload_id))
            .await
    }

    /// Write an evaluation's selected choices and notes back as the answer.
    pub async fn update_answer(
        &self,
        workload_id: &str,
        evaluation: &Evaluation,
        cancel: &CancellationToken,
    ) -> Result<AnswerSummary> {
        require_workload_id(workload_id)?;
        let request = UpdateAnswerRequest {
            workload_id: workload_id.to_string(),
            lens_alias: self.config.lens_alias.clone(),
            question_id: evaluation.question.id.clone(),
            selected_choices: evaluation.selected_choices.clone(),
            notes: evaluation.notes.clone(),
        };
        self.invoker
            .invoke("UpdateAnswer", cancel, || self.api.update_answer(&request))
            .await
    }

    /// Record a named milestone of the workload's current review state.
    pub async fn create_milestone(
        &self,
        workload_id: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<MilestoneRef> {
        require_workload_id(workload_id)?;
        self.invoker
            .invoke("CreateMilestone", cancel, || {
                self.api.create_milestone(workload_id, name)
            })
            .await
    }

    /// Fetch and decode the consolidated report.
    ///
    /// `format` is `pdf` or `json`, in any case.
    pub async fn get_report(
        &self,
        workload_id: &str,
        format: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        require_workload_id(workload_id)?;
        let format: ReportFormat = format.parse()?;
        let encoded = self
            .invoker
            .invoke("GetConsolidatedReport", cancel, || {
                self.api.get_consolidated_report(workload_id, format)
            })
            .await?;
        Ok(BASE64.decode(encoded.trim())?)
    }
}

pub(crate) fn require_workload_id(workload_id: &str) -> Result<()> {
    if workload_id.trim().is_empty() {
        return Err(Error::MissingWorkloadId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, InMemoryReviewApi};
    use crate::observer::RecordingObserver;
    use crate::retry::RetryConfig;
    use std::time::Duration;

    fn engine(api: Arc<InMemoryReviewApi>) -> ReviewEngine {
        let config = ReviewConfig::default().with_retry(RetryConfig::new(
            3,
            Duration::from_millis(10),
            Duration::from_millis(40),
        ));
        ReviewEngine::with_observer(api, config, Arc::new(RecordingObserver::new())).unwrap()
    }

    fn spec(name: &str) -> WorkloadSpec {
        WorkloadSpec {
            name: name.to_string(),
            description: "online shop".into(),
            environment: "PRODUCTION".into(),
            regions: vec!["eu-west-1".into()],
            lenses: vec!["wellarchitected".into()],
        }
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = ReviewConfig::default().with_page_size(0);
        let result = ReviewEngine::new(Arc::new(InMemoryReviewApi::new()), config);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn create_then_get_workload() {
        let api = Arc::new(InMemoryReviewApi::new());
        let engine = engine(api.clone());
        let cancel = CancellationToken::new();

        let created = engine.create_workload(&spec("shop"), &cancel).await.unwrap();
        api.fail_next("GetWorkload", ApiError::throttled("slow down"), 1);
        let fetched = engine.get_workload(&created.id, &cancel).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(api.call_count("GetWorkload"), 2);
    }

    #[tokio::test]
    async fn get_workload_requires_id_before_any_call() {
        let api = Arc::new(InMemoryReviewApi::new());
        let engine = engine(api.clone());

        let err = engine
            .get_workload("  ", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingWorkloadId));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn get_report_decodes_base64_payload() {
        let api = Arc::new(InMemoryReviewApi::new());
        api.set_report("wl-1", ReportFormat::Pdf, b"%PDF-1.7".to_vec());
        let engine = engine(api);

        let bytes = engine
            .get_report("wl-1", "PDF", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn get_report_rejects_unknown_format_before_dispatch() {
        let api = Arc::new(InMemoryReviewApi::new());
        let engine = engine(api.clone());

        let err = engine
            .get_report("wl-1", "docx", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedReportFormat(_)));
        assert!(api.calls().is_empty());
    }
}
