//! Matter (case) entity models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// Lifecycle state of a matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterStatus {
    Lead,
    Open,
    Pending,
    Closed,
    /// Any status this SDK version does not know about.
    #[serde(other)]
    Unknown,
}

impl MatterStatus {
    /// Query-string value for status filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatterStatus::Lead => "lead",
            MatterStatus::Open => "open",
            MatterStatus::Pending => "pending",
            MatterStatus::Closed => "closed",
            MatterStatus::Unknown => "unknown",
        }
    }
}

/// A legal matter handled by the firm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matter {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MatterStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_status_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for creating or updating a matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatterInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MatterStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_status_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Firm-defined refinement of a matter status ("Discovery", "Awaiting docs").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatterSubStatus {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MatterStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
