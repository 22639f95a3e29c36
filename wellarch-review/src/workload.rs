//! Workload resource model consumed by risk enrichment and confidence scoring.
//!
//! The model is produced and owned by the session layer; the engine only reads it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a resource inside the workload definition (e.g. `aws_s3_bucket.logs`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAddress(String);

impl ResourceAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One declared infrastructure resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub address: ResourceAddress,
    /// Declared type, e.g. `aws_db_instance`.
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Resource {
    /// Resource whose address is `<type>.<name>`.
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        let resource_type = resource_type.into();
        let name = name.into();
        Self {
            address: ResourceAddress::new(format!("{resource_type}.{name}")),
            resource_type,
            name,
            attributes: BTreeMap::new(),
        }
    }
}

/// Kind of input the workload model was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A fully resolved infrastructure plan.
    TerraformPlan,
    /// Raw declarative source with unresolved computed values.
    TerraformSource,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Resources and provenance of the workload under review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadModel {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl WorkloadModel {
    /// Build a model from resources with the given source type.
    pub fn new(resources: Vec<Resource>, source_type: SourceType) -> Self {
        Self {
            resources,
            framework: "terraform".to_string(),
            source_type,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_address_is_type_dot_name() {
        let resource = Resource::new("aws_s3_bucket", "logs");
        assert_eq!(resource.address.as_str(), "aws_s3_bucket.logs");
    }

    #[test]
    fn unknown_source_type_deserializes_to_unknown() {
        let source: SourceType = serde_json::from_str("\"cloudformation\"").unwrap();
        assert_eq!(source, SourceType::Unknown);
    }

    #[test]
    fn model_deserializes_with_defaults() {
        let json = r#"{"resources":[{"address":"aws_instance.web","type":"aws_instance"}]}"#;
        let model: WorkloadModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.resource_count(), 1);
        assert_eq!(model.source_type, SourceType::Unknown);
        assert_eq!(model.resources[0].resource_type, "aws_instance");
    }
}
