//! Workspace records.
//!
//! Field names mirror the stored JSON columns so exported data stays readable
//! without the tool.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::WorkbenchError;
use crate::store::Record;

/// Sentinel endpoint method/path under which a system's discovery sample lives.
pub const DISCOVERY_METHOD: &str = "GET";
pub const DISCOVERY_PATH: &str = "__primitive_discovery__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// How a system expects callers to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthType {
    #[default]
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "bearer")]
    Bearer,
}

impl AuthType {
    /// Anything other than `bearer` falls back to an API key.
    pub fn from_user_input(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("bearer") => AuthType::Bearer,
            _ => AuthType::ApiKey,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::ApiKey => "apiKey",
            AuthType::Bearer => "bearer",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external API registered in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub auth_type: AuthType,
    pub docs_url: Option<String>,
    pub created_at: String,
}

/// An integration use case between a source (CTA) and target (CTS) system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub cta_system_id: Option<String>,
    pub cts_system_id: Option<String>,
    pub created_at: String,
}

/// Scenario joined with its field mappings, as listed and shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioWithMappings {
    #[serde(flatten)]
    pub scenario: Scenario,
    pub field_mappings: Vec<FieldMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub id: String,
    pub scenario_id: String,
    pub source_path: String,
    pub target_path: String,
    pub transform_notes: Option<String>,
    pub created_at: String,
}

/// Where a piece of feasibility evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Docs,
    Live,
    Inference,
}

impl EvidenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceSource::Docs => "docs",
            EvidenceSource::Live => "live",
            EvidenceSource::Inference => "inference",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceSource {
    type Err = WorkbenchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "docs" => Ok(EvidenceSource::Docs),
            "live" => Ok(EvidenceSource::Live),
            "inference" => Ok(EvidenceSource::Inference),
            other => Err(WorkbenchError::Invalid(format!(
                "source must be docs, live or inference (got {other:?})"
            ))),
        }
    }
}

/// A recorded fact or limitation affecting a scenario's feasibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub scenario_id: String,
    pub description: String,
    pub category: Option<String>,
    pub source: EvidenceSource,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFlagKind {
    KeyId,
    BusinessCritical,
}

impl FieldFlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldFlagKind::KeyId => "key_id",
            FieldFlagKind::BusinessCritical => "business_critical",
        }
    }
}

impl FromStr for FieldFlagKind {
    type Err = WorkbenchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "key_id" => Ok(FieldFlagKind::KeyId),
            "business_critical" => Ok(FieldFlagKind::BusinessCritical),
            _ => Err(WorkbenchError::Invalid(
                "flag must be key_id or business_critical".to_string(),
            )),
        }
    }
}

/// Marks a discovered field path of a system as an identifier or critical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlag {
    pub id: String,
    pub system_id: String,
    pub field_path: String,
    pub flag: FieldFlagKind,
    pub created_at: String,
}

/// A documented endpoint of a system. The discovery sample is stored as the
/// response schema of the sentinel `(GET, __primitive_discovery__)` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub system_id: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub response_schema: Value,
    pub created_at: String,
}

impl Endpoint {
    pub fn is_discovery_for(&self, system_id: &str) -> bool {
        self.system_id == system_id
            && self.method == DISCOVERY_METHOD
            && self.path == DISCOVERY_PATH
    }
}

macro_rules! impl_record {
    ($ty:ty, $table:literal) => {
        impl Record for $ty {
            const TABLE: &'static str = $table;

            fn id(&self) -> &str {
                &self.id
            }

            fn created_at(&self) -> &str {
                &self.created_at
            }

            fn assign_identity(&mut self, id: String, created_at: String) {
                self.id = id;
                self.created_at = created_at;
            }
        }
    };
}

impl_record!(Project, "projects");
impl_record!(System, "systems");
impl_record!(Scenario, "scenarios");
impl_record!(FieldMapping, "field_mappings");
impl_record!(Constraint, "constraints");
impl_record!(FieldFlag, "field_flags");
impl_record!(Endpoint, "endpoints");

/// Trim user text, mapping blank values to `None`.
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Trim a required user value, rejecting blanks with `message`.
pub fn required(raw: Option<&str>, message: &str) -> Result<String, WorkbenchError> {
    non_blank(raw).ok_or_else(|| WorkbenchError::Invalid(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_type_defaults_to_api_key() {
        assert_eq!(AuthType::from_user_input(Some("bearer")), AuthType::Bearer);
        assert_eq!(AuthType::from_user_input(Some("basic")), AuthType::ApiKey);
        assert_eq!(AuthType::from_user_input(None), AuthType::ApiKey);
        assert_eq!(
            serde_json::to_string(&AuthType::ApiKey).unwrap(),
            "\"apiKey\""
        );
    }

    #[test]
    fn evidence_source_parses_known_values_only() {
        assert_eq!("live".parse::<EvidenceSource>().unwrap(), EvidenceSource::Live);
        assert!("rumor".parse::<EvidenceSource>().is_err());
    }

    #[test]
    fn flag_kind_rejects_unknown_values() {
        let err = "primary".parse::<FieldFlagKind>().unwrap_err();
        assert_eq!(err.to_string(), "flag must be key_id or business_critical");
    }

    #[test]
    fn endpoint_rows_carry_only_the_stored_sample() {
        let row: Endpoint = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "system_id": "s1",
            "method": DISCOVERY_METHOD,
            "path": DISCOVERY_PATH,
            "response_schema": {"id": 1},
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(row.is_discovery_for("s1"));
        let value = serde_json::to_value(&row).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["id", "system_id", "method", "path", "response_schema", "created_at"]
        );
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" x ")), Some("x".to_string()));
        assert!(required(Some(""), "name is required").is_err());
    }
}
