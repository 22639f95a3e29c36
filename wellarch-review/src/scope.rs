//! Scope resolution: turning a [`Scope`] into paginated answer listings.

use tokio_util::sync::CancellationToken;

use crate::api::{AnswerSummary, ListAnswersRequest};
use crate::engine::{ReviewEngine, require_workload_id};
use crate::error::{Error, Result};
use crate::types::{Category, Choice, Question, Scope, ScopeLevel};

/// Convert one remote answer record into a [`Question`].
#[must_use]
pub fn question_from_answer(answer: &AnswerSummary) -> Question {
    Question {
        id: answer.question_id.clone(),
        category: answer.pillar_id,
        title: answer.question_title.clone(),
        description: answer.question_description.clone(),
        choices: answer
            .choices
            .iter()
            .map(|c| Choice {
                id: c.choice_id.clone(),
                title: c.title.clone(),
                description: c.description.clone(),
            })
            .collect(),
        risk_tag: answer.risk.map(|r| r.as_str().to_string()),
    }
}

/// Cursor over the pages of one category's answers.
pub(crate) struct AnswerPages<'a> {
    engine: &'a ReviewEngine,
    cancel: &'a CancellationToken,
    workload_id: &'a str,
    category: Category,
    next_token: Option<String>,
    exhausted: bool,
}

impl<'a> AnswerPages<'a> {
    pub(crate) fn new(
        engine: &'a ReviewEngine,
        workload_id: &'a str,
        category: Category,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            engine,
            cancel,
            workload_id,
            category,
            next_token: None,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the last page has been returned.
    pub(crate) async fn next_page(&mut self) -> Result<Option<Vec<AnswerSummary>>> {
        if self.exhausted {
            return Ok(None);
        }
        let request = ListAnswersRequest {
            workload_id: self.workload_id.to_string(),
            lens_alias: self.engine.config.lens_alias.clone(),
            pillar_id: self.category,
            next_token: self.next_token.take(),
            max_results: self.engine.config.page_size,
        };
        let api = &self.engine.api;
        let page = self
            .engine
            .invoker
            .invoke("ListAnswers", self.cancel, || api.list_answers(&request))
            .await?;

        let next_token = page.next_token.filter(|t| !t.is_empty());
        if next_token.is_some() && next_token == request.next_token {
            self.exhausted = true;
            return Err(Error::PaginationStalled {
                operation: "ListAnswers".to_string(),
                token: next_token.unwrap_or_default(),
            });
        }
        self.next_token = next_token;
        self.exhausted = self.next_token.is_none();
        Ok(Some(page.answers))
    }
}

impl ReviewEngine {
    /// Every answer of one category, across all pages, in remote order.
    pub(crate) async fn fetch_answers(
        &self,
        workload_id: &str,
        category: Category,
        cancel: &CancellationToken,
    ) -> Result<Vec<AnswerSummary>> {
        let mut pages = AnswerPages::new(self, workload_id, category, cancel);
        let mut answers = Vec::new();
        while let Some(page) = pages.next_page().await? {
            answers.extend(page);
        }
        Ok(answers)
    }

    /// Questions selected by `scope`.
    ///
    /// Workload scope lists every category in [`Category::ALL`] order; a
    /// failure in any category fails the call. Item scope ignores
    /// surrounding whitespace in the id and returns exactly one question or
    /// [`Error::QuestionNotFound`].
    pub async fn get_questions(
        &self,
        workload_id: &str,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> Result<Vec<Question>> {
        require_workload_id(workload_id)?;
        scope.validate()?;

        match scope.level {
            ScopeLevel::Workload => {
                let mut questions = Vec::new();
                for category in Category::ALL {
                    let found = self.category_questions(workload_id, category, cancel).await?;
                    questions.extend(found);
                }
                Ok(questions)
            }
            ScopeLevel::Category => {
                let Some(category) = scope.category else {
                    return Err(Error::InvalidScope(
                        "category scope requires a category".to_string(),
                    ));
                };
                self.category_questions(workload_id, category, cancel).await
            }
            ScopeLevel::Item => {
                let item_id = scope.item_id.as_deref().unwrap_or_default().trim();
                let question = self.find_question(workload_id, item_id, cancel).await?;
                Ok(vec![question])
            }
        }
    }

    async fn category_questions(
        &self,
        workload_id: &str,
        category: Category,
        cancel: &CancellationToken,
    ) -> Result<Vec<Question>> {
        let answers = self
            .fetch_answers(workload_id, category, cancel)
            .await
            .map_err(|e| category_error(category, e))?;
        Ok(answers.iter().map(question_from_answer).collect())
    }

    /// Linear scan for a question id, stopping at the first page that holds it.
    ///
    /// If an id exists in several categories, the first category in
    /// [`Category::ALL`] order wins.
    async fn find_question(
        &self,
        workload_id: &str,
        item_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Question> {
        for category in Category::ALL {
            let mut pages = AnswerPages::new(self, workload_id, category, cancel);
            while let Some(page) = pages
                .next_page()
                .await
                .map_err(|e| category_error(category, e))?
            {
                if let Some(answer) = page.iter().find(|a| a.question_id == item_id) {
                    return Ok(question_from_answer(answer));
                }
            }
        }
        Err(Error::QuestionNotFound(item_id.to_string()))
    }
}

pub(crate) fn category_error(category: Category, source: Error) -> Error {
    Error::CategoryFetch {
        category,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        AnswerPage, AnswerRisk, ApiResult, ChoiceSummary, InMemoryReviewApi, MilestoneRef,
        ReportFormat, ReviewApi, UpdateAnswerRequest, Workload, WorkloadSpec,
    };
    use crate::config::ReviewConfig;
    use crate::observer::RecordingObserver;
    use crate::types::MilestoneSnapshot;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Serves real pages but always hands back the same continuation token.
    struct RepeatingTokenApi {
        inner: InMemoryReviewApi,
    }

    #[async_trait]
    impl ReviewApi for RepeatingTokenApi {
        async fn create_workload(&self, spec: &WorkloadSpec) -> ApiResult<Workload> {
            self.inner.create_workload(spec).await
        }

        async fn get_workload(&self, workload_id: &str) -> ApiResult<Workload> {
            self.inner.get_workload(workload_id).await
        }

        async fn list_answers(&self, request: &ListAnswersRequest) -> ApiResult<AnswerPage> {
            let mut page = self.inner.list_answers(request).await?;
            page.next_token = Some("1".to_string());
            Ok(page)
        }

        async fn update_answer(&self, request: &UpdateAnswerRequest) -> ApiResult<AnswerSummary> {
            self.inner.update_answer(request).await
        }

        async fn create_milestone(&self, workload_id: &str, name: &str) -> ApiResult<MilestoneRef> {
            self.inner.create_milestone(workload_id, name).await
        }

        async fn get_milestone(
            &self,
            workload_id: &str,
            milestone_id: &str,
        ) -> ApiResult<MilestoneSnapshot> {
            self.inner.get_milestone(workload_id, milestone_id).await
        }

        async fn get_consolidated_report(
            &self,
            workload_id: &str,
            format: ReportFormat,
        ) -> ApiResult<String> {
            self.inner.get_consolidated_report(workload_id, format).await
        }
    }

    fn answer(id: &str) -> AnswerSummary {
        AnswerSummary {
            question_id: id.to_string(),
            pillar_id: Category::Security,
            question_title: format!("Question {id}"),
            question_description: String::new(),
            choices: vec![],
            selected_choices: vec![],
            risk: Some(AnswerRisk::High),
            is_applicable: true,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn repeated_page_token_stops_pagination() {
        let inner = InMemoryReviewApi::new();
        inner.insert_workload(Workload {
            id: "wl-1".into(),
            arn: "arn".into(),
            name: "shop".into(),
            description: String::new(),
            environment: "PRODUCTION".into(),
            lenses: vec![],
        });
        inner.add_answers("wl-1", [answer("sec-1"), answer("sec-2"), answer("sec-3")]);
        let api = Arc::new(RepeatingTokenApi { inner });
        let engine = ReviewEngine::with_observer(
            api.clone(),
            ReviewConfig::default().with_page_size(1),
            Arc::new(RecordingObserver::new()),
        )
        .unwrap();

        let err = engine
            .get_questions(
                "wl-1",
                &Scope::category(Category::Security),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            Error::CategoryFetch { category, source } => {
                assert_eq!(category, Category::Security);
                assert!(matches!(
                    *source,
                    Error::PaginationStalled { ref token, .. } if token == "1"
                ));
            }
            other => panic!("expected a category failure, got {other:?}"),
        }
        assert_eq!(api.inner.call_count("ListAnswers"), 2);
    }

    #[test]
    fn question_from_answer_copies_fields_and_choices_in_order() {
        let answer = AnswerSummary {
            question_id: "sec-1".into(),
            pillar_id: Category::Security,
            question_title: "How do you manage identities?".into(),
            question_description: "Identity management".into(),
            choices: vec![
                ChoiceSummary {
                    choice_id: "sec_1_a".into(),
                    title: "Use strong sign-in".into(),
                    description: String::new(),
                },
                ChoiceSummary {
                    choice_id: "sec_1_b".into(),
                    title: "Use temporary credentials".into(),
                    description: String::new(),
                },
            ],
            selected_choices: vec!["sec_1_a".into()],
            risk: Some(AnswerRisk::Medium),
            is_applicable: true,
            notes: String::new(),
        };

        let question = question_from_answer(&answer);

        assert_eq!(question.id, "sec-1");
        assert_eq!(question.category, Category::Security);
        assert_eq!(question.description, "Identity management");
        let ids: Vec<_> = question.choices.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["sec_1_a", "sec_1_b"]);
        assert_eq!(question.risk_tag.as_deref(), Some("MEDIUM"));
    }
}
