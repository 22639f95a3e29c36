//! Risk derivation and improvement planning.
//!
//! Risks come from answer records the remote service flags as high, medium
//! or unanswered. Each risk is optionally linked to the workload resources
//! relevant to its category and then turned into one prioritized
//! [`ImprovementPlanItem`].

use tokio_util::sync::CancellationToken;

use crate::api::{AnswerRisk, AnswerSummary};
use crate::config::DEFAULT_DOCS_BASE_URL;
use crate::engine::{ReviewEngine, require_workload_id};
use crate::error::Result;
use crate::observer::ReviewEvent;
use crate::scope::{category_error, question_from_answer};
use crate::types::{Category, Effort, ImprovementPlanItem, Risk, Severity};
use crate::workload::WorkloadModel;

/// Added to the base priority for every missing best practice.
const PRIORITY_PER_MISSING_PRACTICE: u32 = 5;

/// Resource type prefixes pertinent to each category's concerns.
#[must_use]
pub fn relevant_type_prefixes(category: Category) -> &'static [&'static str] {
    match category {
        Category::OperationalExcellence => &[
            "aws_cloudwatch_",
            "aws_cloudtrail",
            "aws_config_",
            "aws_ssm_",
            "aws_sns_topic",
            "aws_codepipeline",
            "aws_codebuild_",
        ],
        Category::Security => &[
            "aws_iam_",
            "aws_kms_",
            "aws_security_group",
            "aws_network_acl",
            "aws_wafv2_",
            "aws_guardduty_",
            "aws_secretsmanager_",
            "aws_s3_bucket_public_access_block",
            "aws_s3_bucket_server_side_encryption_configuration",
        ],
        Category::Reliability => &[
            "aws_db_instance",
            "aws_rds_cluster",
            "aws_autoscaling_group",
            "aws_lb",
            "aws_elb",
            "aws_route53_",
            "aws_backup_",
            "aws_dynamodb_table",
            "aws_s3_bucket_versioning",
        ],
        Category::Performance => &[
            "aws_instance",
            "aws_launch_template",
            "aws_lambda_function",
            "aws_cloudfront_distribution",
            "aws_elasticache_",
            "aws_dynamodb_table",
            "aws_ebs_volume",
        ],
        Category::CostOptimization => &[
            "aws_instance",
            "aws_ebs_volume",
            "aws_nat_gateway",
            "aws_db_instance",
            "aws_s3_bucket_lifecycle_configuration",
            "aws_budgets_",
            "aws_ce_",
        ],
        Category::Sustainability => &[
            "aws_instance",
            "aws_autoscaling_group",
            "aws_lambda_function",
            "aws_ecs_",
            "aws_s3_bucket_lifecycle_configuration",
        ],
    }
}

/// Whether a remote answer represents a risk worth tracking.
fn is_risk(answer: &AnswerSummary) -> bool {
    answer.is_applicable
        && !matches!(
            answer.risk,
            Some(AnswerRisk::None) | Some(AnswerRisk::NotApplicable)
        )
}

fn severity_of(risk: Option<AnswerRisk>) -> Severity {
    match risk {
        Some(AnswerRisk::High) => Severity::High,
        Some(AnswerRisk::Medium) => Severity::Medium,
        _ => Severity::None,
    }
}

/// Convert a risk-flagged answer into a [`Risk`].
///
/// Every available choice that is not selected becomes a missing best practice.
#[must_use]
pub fn risk_from_answer(answer: &AnswerSummary) -> Risk {
    let question = question_from_answer(answer);
    let missing_best_practices = question
        .choices
        .iter()
        .filter(|c| !answer.selected_choices.contains(&c.id))
        .cloned()
        .collect();
    let severity = severity_of(answer.risk);
    Risk {
        id: format!("risk-{}", answer.question_id),
        category: answer.pillar_id,
        severity,
        description: format!("{} risk: {}", severity.label(), answer.question_title),
        question,
        missing_best_practices,
        affected_resources: Vec::new(),
    }
}

/// Link each risk to the workload resources relevant to its category.
///
/// Without a model the risks are returned unchanged.
#[must_use]
pub fn enhance_with_resources(mut risks: Vec<Risk>, model: Option<&WorkloadModel>) -> Vec<Risk> {
    let Some(model) = model else {
        return risks;
    };
    for risk in &mut risks {
        let prefixes = relevant_type_prefixes(risk.category);
        risk.affected_resources = model
            .resources
            .iter()
            .filter(|r| prefixes.iter().any(|p| r.resource_type.starts_with(p)))
            .map(|r| r.address.clone())
            .collect();
    }
    risks
}

/// Priority of a risk: severity base plus a bonus per missing practice.
#[must_use]
pub fn priority(risk: &Risk) -> u32 {
    let missing = u32::try_from(risk.missing_best_practices.len()).unwrap_or(u32::MAX);
    risk.severity
        .base_priority()
        .saturating_add(missing.saturating_mul(PRIORITY_PER_MISSING_PRACTICE))
}

/// Effort estimate from missing practices plus affected resources.
#[must_use]
pub fn estimated_effort(risk: &Risk) -> Effort {
    Effort::from_complexity(risk.missing_best_practices.len() + risk.affected_resources.len())
}

/// Documentation link for one best practice.
#[must_use]
pub fn best_practice_url(docs_base_url: &str, category: Category, practice_id: &str) -> String {
    format!(
        "{}/{}/{}.html",
        docs_base_url.trim_end_matches('/'),
        category.docs_segment(),
        practice_id
    )
}

/// One improvement plan item per risk, in input order, using the default
/// documentation root.
#[must_use]
pub fn build_improvement_plan(risks: &[Risk]) -> Vec<ImprovementPlanItem> {
    build_improvement_plan_with_docs(risks, DEFAULT_DOCS_BASE_URL)
}

/// Like [`build_improvement_plan`] with a custom documentation root.
#[must_use]
pub fn build_improvement_plan_with_docs(
    risks: &[Risk],
    docs_base_url: &str,
) -> Vec<ImprovementPlanItem> {
    risks
        .iter()
        .map(|risk| ImprovementPlanItem {
            id: format!("plan-{}", risk.question.id),
            description: plan_description(risk),
            best_practice_refs: risk
                .missing_best_practices
                .iter()
                .map(|bp| best_practice_url(docs_base_url, risk.category, &bp.id))
                .collect(),
            affected_resources: risk.affected_resources.clone(),
            priority: priority(risk),
            estimated_effort: estimated_effort(risk),
            risk: risk.clone(),
        })
        .collect()
}

fn plan_description(risk: &Risk) -> String {
    match risk.missing_best_practices.as_slice() {
        [] => format!("Review \"{}\"", risk.question.title),
        [only] => format!("Address \"{}\": {}", risk.question.title, only.title),
        many => format!(
            "Address \"{}\": adopt {} missing best practices",
            risk.question.title,
            many.len()
        ),
    }
}

impl ReviewEngine {
    /// Risks across every category.
    ///
    /// Best effort: a category whose listing fails is reported to the
    /// observer and skipped.
    pub async fn get_risks(
        &self,
        workload_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Risk>> {
        require_workload_id(workload_id)?;

        let mut risks = Vec::new();
        for category in Category::ALL {
            match self.fetch_answers(workload_id, category, cancel).await {
                Ok(answers) => {
                    risks.extend(answers.iter().filter(|a| is_risk(a)).map(risk_from_answer));
                }
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => {
                    let err = category_error(category, err);
                    self.observer.observe(&ReviewEvent::CategorySkipped {
                        category,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(risks)
    }

    /// [`build_improvement_plan`] using this engine's documentation root.
    #[must_use]
    pub fn improvement_plan(&self, risks: &[Risk]) -> Vec<ImprovementPlanItem> {
        build_improvement_plan_with_docs(risks, &self.config.docs_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChoiceSummary;
    use crate::workload::{Resource, ResourceAddress, SourceType};

    fn answer(id: &str, category: Category, risk: AnswerRisk, selected: &[&str]) -> AnswerSummary {
        AnswerSummary {
            question_id: id.to_string(),
            pillar_id: category,
            question_title: format!("Question {id}"),
            question_description: String::new(),
            choices: ["a", "b", "c", "d"]
                .iter()
                .map(|c| ChoiceSummary {
                    choice_id: format!("{id}_{c}"),
                    title: format!("Practice {c}"),
                    description: String::new(),
                })
                .collect(),
            selected_choices: selected.iter().map(|c| format!("{id}_{c}")).collect(),
            risk: Some(risk),
            is_applicable: true,
            notes: String::new(),
        }
    }

    #[test]
    fn risk_records_unselected_choices_as_missing() {
        let risk = risk_from_answer(&answer("sec1", Category::Security, AnswerRisk::High, &["a"]));

        assert_eq!(risk.severity, Severity::High);
        assert_eq!(risk.id, "risk-sec1");
        let missing: Vec<_> = risk
            .missing_best_practices
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(missing, ["sec1_b", "sec1_c", "sec1_d"]);
        assert!(risk.affected_resources.is_empty());
    }

    #[test]
    fn no_risk_and_not_applicable_answers_are_filtered() {
        assert!(!is_risk(&answer("q", Category::Security, AnswerRisk::None, &[])));
        assert!(!is_risk(&answer(
            "q",
            Category::Security,
            AnswerRisk::NotApplicable,
            &[]
        )));
        let mut skipped = answer("q", Category::Security, AnswerRisk::High, &[]);
        skipped.is_applicable = false;
        assert!(!is_risk(&skipped));
        assert!(is_risk(&answer("q", Category::Security, AnswerRisk::Medium, &[])));
        assert!(is_risk(&answer(
            "q",
            Category::Security,
            AnswerRisk::Unanswered,
            &[]
        )));
    }

    #[test]
    fn unanswered_risk_maps_to_none_severity() {
        let risk = risk_from_answer(&answer("q", Category::Security, AnswerRisk::Unanswered, &[]));
        assert_eq!(risk.severity, Severity::None);
    }

    #[test]
    fn enhance_matches_resource_types_by_category_prefix() {
        let model = WorkloadModel::new(
            vec![
                Resource::new("aws_iam_role", "app"),
                Resource::new("aws_kms_key", "data"),
                Resource::new("aws_db_instance", "main"),
                Resource::new("aws_s3_bucket", "assets"),
            ],
            SourceType::TerraformPlan,
        );
        let risks = vec![
            risk_from_answer(&answer("sec1", Category::Security, AnswerRisk::High, &[])),
            risk_from_answer(&answer("rel1", Category::Reliability, AnswerRisk::Medium, &[])),
        ];

        let risks = enhance_with_resources(risks, Some(&model));

        let security: Vec<_> = risks[0].affected_resources.iter().map(|a| a.as_str()).collect();
        assert_eq!(security, ["aws_iam_role.app", "aws_kms_key.data"]);
        let reliability: Vec<_> = risks[1].affected_resources.iter().map(|a| a.as_str()).collect();
        assert_eq!(reliability, ["aws_db_instance.main"]);
    }

    #[test]
    fn enhance_without_model_passes_risks_through() {
        let risks = vec![risk_from_answer(&answer(
            "sec1",
            Category::Security,
            AnswerRisk::High,
            &[],
        ))];
        let enhanced = enhance_with_resources(risks.clone(), None);
        assert_eq!(enhanced, risks);
    }

    #[test]
    fn high_risk_with_three_missing_practices_has_priority_115() {
        let risk = risk_from_answer(&answer("sec1", Category::Security, AnswerRisk::High, &["a"]));
        assert_eq!(risk.missing_best_practices.len(), 3);
        assert_eq!(priority(&risk), 115);
    }

    #[test]
    fn priority_bases_follow_severity() {
        let all = &["a", "b", "c", "d"];
        let medium = risk_from_answer(&answer("q", Category::Security, AnswerRisk::Medium, all));
        let none = risk_from_answer(&answer("q", Category::Security, AnswerRisk::Unanswered, all));
        assert_eq!(priority(&medium), 50);
        assert_eq!(priority(&none), 10);
    }

    #[test]
    fn two_missing_and_one_resource_is_medium_effort() {
        let mut risk =
            risk_from_answer(&answer("rel1", Category::Reliability, AnswerRisk::High, &["a", "b"]));
        risk.affected_resources = vec![ResourceAddress::new("aws_db_instance.main")];

        assert_eq!(estimated_effort(&risk), Effort::Medium);
    }

    #[test]
    fn plan_has_one_item_per_risk_with_docs_links() {
        let risks = vec![
            risk_from_answer(&answer("sec1", Category::Security, AnswerRisk::High, &["a", "b"])),
            risk_from_answer(&answer("cost1", Category::CostOptimization, AnswerRisk::Medium, &[])),
        ];

        let plan = build_improvement_plan(&risks);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].risk.id, "risk-sec1");
        assert_eq!(
            plan[0].best_practice_refs,
            [
                "https://docs.aws.amazon.com/wellarchitected/latest/security-pillar/sec1_c.html",
                "https://docs.aws.amazon.com/wellarchitected/latest/security-pillar/sec1_d.html",
            ]
        );
        assert_eq!(plan[0].priority, 110);
        assert_eq!(plan[0].estimated_effort, Effort::Low);
        assert_eq!(plan[1].best_practice_refs.len(), 4);
        assert_eq!(plan[1].estimated_effort, Effort::Medium);
    }

    #[test]
    fn plan_is_deterministic() {
        let risks = vec![risk_from_answer(&answer(
            "ops1",
            Category::OperationalExcellence,
            AnswerRisk::High,
            &[],
        ))];
        assert_eq!(build_improvement_plan(&risks), build_improvement_plan(&risks));
    }
}
