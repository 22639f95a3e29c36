//! Review session record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wellarch_review::{Evaluation, ImprovementPlanItem, Risk, WorkloadModel};

/// Everything produced during one review of one workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    /// Workload id in the remote review service, once registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_workload_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_model: Option<WorkloadModel>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub improvement_plan: Vec<ImprovementPlanItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// New empty session with a time-ordered id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            remote_workload_id: None,
            workload_model: None,
            evaluations: Vec::new(),
            risks: Vec::new(),
            improvement_plan: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the stored evaluation for the same question, or append.
    pub fn record_evaluation(&mut self, evaluation: Evaluation) {
        match self
            .evaluations
            .iter_mut()
            .find(|e| e.question.id == evaluation.question.id)
        {
            Some(existing) => *existing = evaluation,
            None => self.evaluations.push(evaluation),
        }
    }

    /// Evaluation recorded for `question_id`, if any.
    pub fn evaluation(&self, question_id: &str) -> Option<&Evaluation> {
        self.evaluations.iter().find(|e| e.question.id == question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wellarch_review::{Category, Question};

    fn evaluation(question_id: &str, notes: &str) -> Evaluation {
        Evaluation {
            question: Question {
                id: question_id.to_string(),
                category: Category::Security,
                title: "How do you protect data at rest?".into(),
                description: String::new(),
                choices: vec![],
                risk_tag: None,
            },
            selected_choices: vec![],
            evidence: vec![],
            confidence_score: 0.5,
            notes: notes.to_string(),
        }
    }

    #[test]
    fn new_session_has_v7_id_and_matching_timestamps() {
        let session = Session::new("checkout review");
        let id = Uuid::parse_str(&session.id).unwrap();
        assert_eq!(id.get_version_num(), 7);
        assert_eq!(session.created_at, session.updated_at);
        assert!(session.evaluations.is_empty());
    }

    #[test]
    fn record_evaluation_replaces_same_question() {
        let mut session = Session::new("review");
        session.record_evaluation(evaluation("sec-8", "first pass"));
        session.record_evaluation(evaluation("sec-9", "other"));
        session.record_evaluation(evaluation("sec-8", "second pass"));

        assert_eq!(session.evaluations.len(), 2);
        assert_eq!(session.evaluation("sec-8").unwrap().notes, "second pass");
        assert!(session.evaluation("rel-1").is_none());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let json = serde_json::to_value(Session::new("review")).unwrap();
        assert!(json.get("remote_workload_id").is_none());
        assert!(json.get("workload_model").is_none());
        assert_eq!(json["evaluations"], serde_json::json!([]));
    }
}
