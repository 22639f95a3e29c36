//! In-memory [`ReviewApi`] implementation for testing.
//!
//! Serves paginated answers, milestones and reports from process memory,
//! records every call, and can be scripted to fail specific operations.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;

use super::{
    AnswerPage, AnswerRisk, AnswerSummary, ApiError, ApiResult, ErrorCode, ListAnswersRequest,
    MilestoneRef, ReportFormat, ReviewApi, UpdateAnswerRequest, Workload, WorkloadSpec,
};
use crate::types::{Category, MilestoneSnapshot, Severity};

/// A call received by [`InMemoryReviewApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateWorkload {
        name: String,
    },
    GetWorkload {
        workload_id: String,
    },
    ListAnswers {
        workload_id: String,
        category: Category,
        next_token: Option<String>,
    },
    UpdateAnswer {
        workload_id: String,
        question_id: String,
    },
    CreateMilestone {
        workload_id: String,
        name: String,
    },
    GetMilestone {
        workload_id: String,
        milestone_id: String,
    },
    GetConsolidatedReport {
        workload_id: String,
        format: ReportFormat,
    },
}

impl ApiCall {
    /// Operation name, matching the names the engine logs under.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateWorkload { .. } => "CreateWorkload",
            Self::GetWorkload { .. } => "GetWorkload",
            Self::ListAnswers { .. } => "ListAnswers",
            Self::UpdateAnswer { .. } => "UpdateAnswer",
            Self::CreateMilestone { .. } => "CreateMilestone",
            Self::GetMilestone { .. } => "GetMilestone",
            Self::GetConsolidatedReport { .. } => "GetConsolidatedReport",
        }
    }
}

#[derive(Default)]
struct State {
    workloads: HashMap<String, Workload>,
    answers: HashMap<(String, Category), Vec<AnswerSummary>>,
    milestones: HashMap<(String, String), MilestoneSnapshot>,
    reports: HashMap<(String, ReportFormat), Vec<u8>>,
    scripted_failures: HashMap<String, VecDeque<ApiError>>,
    category_failures: HashMap<Category, ApiError>,
    calls: Vec<ApiCall>,
    next_id: u64,
}

impl State {
    fn record(&mut self, call: ApiCall) -> ApiResult<()> {
        let operation = call.operation();
        self.calls.push(call);
        match self
            .scripted_failures
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_workload(&self, workload_id: &str) -> ApiResult<&Workload> {
        self.workloads
            .get(workload_id)
            .ok_or_else(|| ApiError::not_found(format!("workload {workload_id} does not exist")))
    }

    fn risk_counts(&self, workload_id: &str) -> BTreeMap<Severity, u32> {
        let mut counts = BTreeMap::new();
        for ((id, _), answers) in &self.answers {
            if id != workload_id {
                continue;
            }
            for answer in answers {
                let severity = match answer.risk {
                    Some(AnswerRisk::High) => Severity::High,
                    Some(AnswerRisk::Medium) => Severity::Medium,
                    _ => continue,
                };
                *counts.entry(severity).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// In-memory remote review API.
pub struct InMemoryReviewApi {
    state: Mutex<State>,
    max_page_size: usize,
}

impl InMemoryReviewApi {
    /// Create an empty API that serves up to 50 answers per page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            max_page_size: 50,
        }
    }

    /// Cap the number of answers served per page, regardless of the request.
    #[must_use]
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a workload directly, bypassing `create_workload`.
    pub fn insert_workload(&self, workload: Workload) {
        self.state().workloads.insert(workload.id.clone(), workload);
    }

    /// Add answers to a workload; they are grouped by their pillar.
    pub fn add_answers(&self, workload_id: &str, answers: impl IntoIterator<Item = AnswerSummary>) {
        let mut state = self.state();
        for answer in answers {
            state
                .answers
                .entry((workload_id.to_string(), answer.pillar_id))
                .or_default()
                .push(answer);
        }
    }

    /// Store a milestone that `get_milestone` will serve.
    pub fn insert_milestone(&self, workload_id: &str, snapshot: MilestoneSnapshot) {
        self.state()
            .milestones
            .insert((workload_id.to_string(), snapshot.id.clone()), snapshot);
    }

    /// Store the raw bytes of a report.
    pub fn set_report(&self, workload_id: &str, format: ReportFormat, bytes: Vec<u8>) {
        self.state()
            .reports
            .insert((workload_id.to_string(), format), bytes);
    }

    /// Fail the next `times` calls of `operation` with `error`.
    pub fn fail_next(&self, operation: &str, error: ApiError, times: usize) {
        let mut state = self.state();
        let queue = state
            .scripted_failures
            .entry(operation.to_string())
            .or_default();
        queue.extend(std::iter::repeat_n(error, times));
    }

    /// Fail every `ListAnswers` call for `category` with `error`.
    pub fn fail_category(&self, category: Category, error: ApiError) {
        self.state().category_failures.insert(category, error);
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Number of calls received for `operation`.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Categories requested by `ListAnswers`, one entry per page fetched.
    #[must_use]
    pub fn listed_categories(&self) -> Vec<Category> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                ApiCall::ListAnswers { category, .. } => Some(*category),
                _ => None,
            })
            .collect()
    }
}

impl Default for InMemoryReviewApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewApi for InMemoryReviewApi {
    async fn create_workload(&self, spec: &WorkloadSpec) -> ApiResult<Workload> {
        let mut state = self.state();
        state.record(ApiCall::CreateWorkload {
            name: spec.name.clone(),
        })?;
        if spec.name.trim().is_empty() {
            return Err(ApiError::new(
                ErrorCode::Validation,
                "workload name must not be empty",
            ));
        }
        let id = format!("wl-{:04}", state.next_id());
        let workload = Workload {
            arn: format!("arn:aws:wellarchitected:local:000000000000:workload/{id}"),
            id: id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            environment: spec.environment.clone(),
            lenses: spec.lenses.clone(),
        };
        state.workloads.insert(id, workload.clone());
        Ok(workload)
    }

    async fn get_workload(&self, workload_id: &str) -> ApiResult<Workload> {
        let mut state = self.state();
        state.record(ApiCall::GetWorkload {
            workload_id: workload_id.to_string(),
        })?;
        state.require_workload(workload_id).cloned()
    }

    async fn list_answers(&self, request: &ListAnswersRequest) -> ApiResult<AnswerPage> {
        let mut state = self.state();
        state.record(ApiCall::ListAnswers {
            workload_id: request.workload_id.clone(),
            category: request.pillar_id,
            next_token: request.next_token.clone(),
        })?;
        if let Some(err) = state.category_failures.get(&request.pillar_id) {
            return Err(err.clone());
        }
        state.require_workload(&request.workload_id)?;

        let start = match &request.next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                ApiError::new(ErrorCode::Validation, format!("invalid next token {token}"))
            })?,
            None => 0,
        };
        let page_size = (request.max_results as usize).clamp(1, self.max_page_size);
        let all = state
            .answers
            .get(&(request.workload_id.clone(), request.pillar_id))
            .map(Vec::as_slice)
            .unwrap_or_default();
        if start > all.len() {
            return Err(ApiError::new(
                ErrorCode::Validation,
                format!("next token {start} is past the last answer"),
            ));
        }
        let end = start.saturating_add(page_size).min(all.len());
        let answers = all.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_token = (end < all.len()).then(|| end.to_string());
        Ok(AnswerPage {
            answers,
            next_token,
        })
    }

    async fn update_answer(&self, request: &UpdateAnswerRequest) -> ApiResult<AnswerSummary> {
        let mut state = self.state();
        state.record(ApiCall::UpdateAnswer {
            workload_id: request.workload_id.clone(),
            question_id: request.question_id.clone(),
        })?;
        state.require_workload(&request.workload_id)?;
        let answer = state
            .answers
            .iter_mut()
            .filter(|((id, _), _)| *id == request.workload_id)
            .flat_map(|(_, answers)| answers.iter_mut())
            .find(|a| a.question_id == request.question_id)
            .ok_or_else(|| {
                ApiError::not_found(format!("question {} does not exist", request.question_id))
            })?;
        if let Some(unknown) = request
            .selected_choices
            .iter()
            .find(|id| !answer.choices.iter().any(|c| &c.choice_id == *id))
        {
            return Err(ApiError::new(
                ErrorCode::Validation,
                format!("choice {unknown} is not available on {}", answer.question_id),
            ));
        }
        answer.selected_choices = request.selected_choices.clone();
        answer.notes = request.notes.clone();
        Ok(answer.clone())
    }

    async fn create_milestone(&self, workload_id: &str, name: &str) -> ApiResult<MilestoneRef> {
        let mut state = self.state();
        state.record(ApiCall::CreateMilestone {
            workload_id: workload_id.to_string(),
            name: name.to_string(),
        })?;
        state.require_workload(workload_id)?;
        if state
            .milestones
            .iter()
            .any(|((id, _), m)| id == workload_id && m.name == name)
        {
            return Err(ApiError::new(
                ErrorCode::Conflict,
                format!("milestone {name} already exists"),
            ));
        }
        let milestone_id = state.next_id().to_string();
        let snapshot = MilestoneSnapshot {
            id: milestone_id.clone(),
            name: name.to_string(),
            recorded_at: Utc::now(),
            risk_counts: state.risk_counts(workload_id),
        };
        state
            .milestones
            .insert((workload_id.to_string(), milestone_id.clone()), snapshot);
        Ok(MilestoneRef {
            workload_id: workload_id.to_string(),
            milestone_id,
        })
    }

    async fn get_milestone(
        &self,
        workload_id: &str,
        milestone_id: &str,
    ) -> ApiResult<MilestoneSnapshot> {
        let mut state = self.state();
        state.record(ApiCall::GetMilestone {
            workload_id: workload_id.to_string(),
            milestone_id: milestone_id.to_string(),
        })?;
        state
            .milestones
            .get(&(workload_id.to_string(), milestone_id.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("milestone {milestone_id} does not exist")))
    }

    async fn get_consolidated_report(
        &self,
        workload_id: &str,
        format: ReportFormat,
    ) -> ApiResult<String> {
        let mut state = self.state();
        state.record(ApiCall::GetConsolidatedReport {
            workload_id: workload_id.to_string(),
            format,
        })?;
        state
            .reports
            .get(&(workload_id.to_string(), format))
            .map(|bytes| BASE64.encode(bytes))
            .ok_or_else(|| {
                ApiError::not_found(format!("no {} report for {workload_id}", format.as_str()))
            })
    }
}
