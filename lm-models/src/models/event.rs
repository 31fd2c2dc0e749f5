//! Calendar event models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// A calendar event (consultation, hearing, deadline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EntityId,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_location_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matter_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendee_ids: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for creating or updating an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_location_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matter_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendee_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLocation {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::envelope_roundtrip;
    use chrono::TimeZone;

    #[test]
    fn test_event_roundtrip() {
        let event = Event {
            id: 55,
            name: "Initial consultation".into(),
            start_time: Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
            end_time: Some(Utc.with_ymd_and_hms(2024, 3, 4, 16, 0, 0).unwrap()),
            all_day: false,
            description: Some("Bring documents".into()),
            event_type_id: Some(1),
            event_location_id: Some(2),
            contact_id: Some(7),
            matter_id: Some(100),
            attendee_ids: vec![11, 12],
            created_at: None,
            updated_at: None,
        };
        assert_eq!(envelope_roundtrip(&event), event);
    }

    #[test]
    fn test_types_and_locations_roundtrip() {
        let kind = EventType {
            id: 1,
            name: "Hearing".into(),
            color: Some("#ff0000".into()),
            duration_minutes: Some(90),
            created_at: None,
            updated_at: None,
        };
        assert_eq!(envelope_roundtrip(&kind), kind);

        let location = EventLocation {
            id: 2,
            name: "Courtroom 4".into(),
            address: Some("100 Court St".into()),
            virtual_url: None,
            created_at: Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()),
            updated_at: None,
        };
        assert_eq!(envelope_roundtrip(&location), location);
    }
}
