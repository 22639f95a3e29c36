//! AI question evaluator boundary.

use async_trait::async_trait;
use thiserror::Error;

use crate::confidence;
use crate::engine::ReviewEngine;
use crate::observer::ReviewEvent;
use crate::types::{Evaluation, Question};
use crate::workload::WorkloadModel;

/// Failure reported by a [`QuestionEvaluator`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EvaluatorError(pub String);

impl EvaluatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Produces a candidate answer for a question from the workload model.
///
/// The returned [`Evaluation::confidence_score`] is the evaluator's own
/// estimate; the engine discounts it for data quality.
#[async_trait]
pub trait QuestionEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        question: &Question,
        model: &WorkloadModel,
    ) -> Result<Evaluation, EvaluatorError>;
}

impl ReviewEngine {
    /// Evaluate one question and score the result.
    ///
    /// Never fails: if no evaluator is attached or the evaluator errors, a
    /// zero-confidence placeholder carrying the reason in `notes` is returned.
    pub async fn evaluate_question(
        &self,
        question: &Question,
        model: &WorkloadModel,
    ) -> Evaluation {
        let result = match &self.evaluator {
            Some(evaluator) => evaluator.evaluate(question, model).await,
            None => Err(EvaluatorError::new("no evaluator configured")),
        };

        match result {
            Ok(mut evaluation) => {
                evaluation.confidence_score = confidence::score(&evaluation, model);
                evaluation
            }
            Err(err) => {
                self.observer.observe(&ReviewEvent::EvaluatorFailed {
                    question_id: question.id.clone(),
                    error: err.to_string(),
                });
                Evaluation::insufficient(question.clone(), err)
            }
        }
    }

    /// Evaluate each question in order.
    pub async fn evaluate_questions(
        &self,
        questions: &[Question],
        model: &WorkloadModel,
    ) -> Vec<Evaluation> {
        let mut evaluations = Vec::with_capacity(questions.len());
        for question in questions {
            evaluations.push(self.evaluate_question(question, model).await);
        }
        evaluations
    }
}
