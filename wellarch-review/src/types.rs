//! Core review entities: categories, scopes, questions, risks, plans and milestones.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::workload::ResourceAddress;

/// Top-level grouping of review questions (a framework "pillar").
///
/// The declaration order is the fixed enumeration order used whenever the
/// engine walks every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    OperationalExcellence,
    Security,
    Reliability,
    Performance,
    CostOptimization,
    Sustainability,
}

impl Category {
    /// Every category, in enumeration order.
    pub const ALL: [Category; 6] = [
        Category::OperationalExcellence,
        Category::Security,
        Category::Reliability,
        Category::Performance,
        Category::CostOptimization,
        Category::Sustainability,
    ];

    /// Pillar identifier used by the remote review API.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OperationalExcellence => "operationalExcellence",
            Self::Security => "security",
            Self::Reliability => "reliability",
            Self::Performance => "performance",
            Self::CostOptimization => "costOptimization",
            Self::Sustainability => "sustainability",
        }
    }

    /// Parse a remote pillar identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Path segment of this category's best-practice documentation.
    #[must_use]
    pub fn docs_segment(&self) -> &'static str {
        match self {
            Self::OperationalExcellence => "operational-excellence-pillar",
            Self::Security => "security-pillar",
            Self::Reliability => "reliability-pillar",
            Self::Performance => "performance-efficiency-pillar",
            Self::CostOptimization => "cost-optimization-pillar",
            Self::Sustainability => "sustainability-pillar",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selection granularity for a review operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    /// Every question of the workload.
    Workload,
    /// Every question of one category.
    Category,
    /// A single question.
    Item,
}

/// Which questions a review operation applies to.
///
/// Scopes usually arrive from callers as loose data, so the shape is checked
/// by [`Scope::validate`] instead of being enforced by the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub level: ScopeLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

impl Scope {
    /// Scope covering the whole workload.
    #[must_use]
    pub fn workload() -> Self {
        Self {
            level: ScopeLevel::Workload,
            category: None,
            item_id: None,
        }
    }

    /// Scope covering one category.
    #[must_use]
    pub fn category(category: Category) -> Self {
        Self {
            level: ScopeLevel::Category,
            category: Some(category),
            item_id: None,
        }
    }

    /// Scope covering one question.
    #[must_use]
    pub fn item(item_id: impl Into<String>) -> Self {
        Self {
            level: ScopeLevel::Item,
            category: None,
            item_id: Some(item_id.into()),
        }
    }

    /// Check that the fields required by `level` are present.
    pub fn validate(&self) -> Result<()> {
        match self.level {
            ScopeLevel::Workload => Ok(()),
            ScopeLevel::Category if self.category.is_none() => Err(Error::InvalidScope(
                "category scope requires a category".to_string(),
            )),
            ScopeLevel::Category => Ok(()),
            ScopeLevel::Item => match self.item_id.as_deref() {
                Some(id) if !id.trim().is_empty() => Ok(()),
                _ => Err(Error::InvalidScope(
                    "item scope requires a non-empty item id".to_string(),
                )),
            },
        }
    }
}

/// A best-practice option available on a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A best practice the workload does not follow yet.
pub type BestPractice = Choice;

/// A review question, converted from one remote answer summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Risk level the remote system currently assigns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tag: Option<String>,
}

/// Severity of a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    None,
}

impl Severity {
    /// Capitalized name used in human-facing messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::None => "None",
        }
    }

    /// Base improvement-plan priority for this severity.
    #[must_use]
    pub fn base_priority(&self) -> u32 {
        match self {
            Self::High => 100,
            Self::Medium => 50,
            Self::None => 10,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A gap between the workload's configuration and recommended practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub description: String,
    pub question: Question,
    #[serde(default)]
    pub missing_best_practices: Vec<BestPractice>,
    /// Empty until enriched with a workload resource model.
    #[serde(default)]
    pub affected_resources: Vec<ResourceAddress>,
}

/// Rough remediation effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    /// Map a complexity count onto an effort bucket.
    #[must_use]
    pub fn from_complexity(complexity: usize) -> Self {
        match complexity {
            0..=2 => Self::Low,
            3..=5 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// A prioritized remediation unit derived from one risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPlanItem {
    pub id: String,
    pub risk: Risk,
    pub description: String,
    pub best_practice_refs: Vec<String>,
    pub affected_resources: Vec<ResourceAddress>,
    pub priority: u32,
    pub estimated_effort: Effort,
}

/// A piece of evidence backing an automated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub description: String,
    /// Resource the evidence was observed on, when it is that concrete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceAddress>,
}

impl Evidence {
    /// Evidence that is not tied to a resource.
    pub fn general(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            resource: None,
        }
    }

    /// Evidence observed on a specific resource.
    pub fn on_resource(description: impl Into<String>, resource: ResourceAddress) -> Self {
        Self {
            description: description.into(),
            resource: Some(resource),
        }
    }
}

/// An automated answer to one question.
///
/// A zero confidence score means "insufficient data", not failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub question: Question,
    #[serde(default)]
    pub selected_choices: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    pub confidence_score: f64,
    #[serde(default)]
    pub notes: String,
}

impl Evaluation {
    /// Placeholder used when no automated answer could be produced.
    pub fn insufficient(question: Question, reason: impl fmt::Display) -> Self {
        Self {
            question,
            selected_choices: Vec::new(),
            evidence: Vec::new(),
            confidence_score: 0.0,
            notes: format!("automated evaluation failed: {reason}"),
        }
    }
}

/// Point-in-time copy of a workload's review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneSnapshot {
    pub id: String,
    pub name: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub risk_counts: BTreeMap<Severity, u32>,
}

impl MilestoneSnapshot {
    /// Number of risks of `severity`, zero when the snapshot has none recorded.
    #[must_use]
    pub fn risk_count(&self, severity: Severity) -> u32 {
        self.risk_counts.get(&severity).copied().unwrap_or(0)
    }
}

/// Categorized differences between two milestones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneComparison {
    pub snapshot_id1: String,
    pub snapshot_id2: String,
    pub improvements: Vec<String>,
    pub regressions: Vec<String>,
    /// Never populated by the count-based comparison.
    pub new_risks: Vec<String>,
    /// Never populated by the count-based comparison.
    pub resolved_risks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_round_trips_remote_ids() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("unknown"), None);
    }

    #[test]
    fn category_serializes_as_remote_pillar_id() {
        let json = serde_json::to_string(&Category::CostOptimization).unwrap();
        assert_eq!(json, "\"costOptimization\"");
    }

    #[test]
    fn category_scope_without_category_is_invalid() {
        let scope = Scope {
            level: ScopeLevel::Category,
            category: None,
            item_id: None,
        };
        assert!(matches!(scope.validate(), Err(Error::InvalidScope(_))));
    }

    #[test]
    fn item_scope_with_blank_id_is_invalid() {
        assert!(Scope::item("").validate().is_err());
        assert!(Scope::item("   ").validate().is_err());
        let missing = Scope {
            level: ScopeLevel::Item,
            category: None,
            item_id: None,
        };
        assert!(missing.validate().is_err());
    }

    #[test]
    fn well_formed_scopes_validate() {
        assert!(Scope::workload().validate().is_ok());
        assert!(Scope::category(Category::Security).validate().is_ok());
        assert!(Scope::item("sec-1").validate().is_ok());
    }

    #[test]
    fn effort_buckets_follow_complexity() {
        assert_eq!(Effort::from_complexity(0), Effort::Low);
        assert_eq!(Effort::from_complexity(2), Effort::Low);
        assert_eq!(Effort::from_complexity(3), Effort::Medium);
        assert_eq!(Effort::from_complexity(5), Effort::Medium);
        assert_eq!(Effort::from_complexity(6), Effort::High);
    }

    #[test]
    fn insufficient_evaluation_has_zero_confidence_and_reason() {
        let question = Question {
            id: "q".into(),
            category: Category::Security,
            title: "t".into(),
            description: String::new(),
            choices: vec![],
            risk_tag: None,
        };
        let eval = Evaluation::insufficient(question, "model timed out");
        assert_eq!(eval.confidence_score, 0.0);
        assert!(eval.notes.contains("model timed out"));
    }

    #[test]
    fn snapshot_missing_severity_counts_as_zero() {
        let snapshot = MilestoneSnapshot {
            id: "1".into(),
            name: "baseline".into(),
            recorded_at: Utc::now(),
            risk_counts: BTreeMap::from([(Severity::High, 3)]),
        };
        assert_eq!(snapshot.risk_count(Severity::High), 3);
        assert_eq!(snapshot.risk_count(Severity::Medium), 0);
    }
}
