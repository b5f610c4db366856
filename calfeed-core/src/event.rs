//! Local catalog events.
//!
//! The importer only ever writes [`EventFields`]; approval, attribution and
//! the edit comment belong to the surrounding [`Event`] record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Someone (or something) that edits or approves events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(pub String);

impl Actor {
    pub fn new(name: &str) -> Self {
        Actor(name.to_string())
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The calendar fields the field mapping controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    /// Overflow of an oversized description
    pub content: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    pub organizer: Option<String>,
    pub location: Option<String>,
    /// The upstream item's own URL
    pub external_url: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("title is empty")]
    MissingTitle,

    #[error("start time is missing")]
    MissingStart,

    #[error("end time is before start time")]
    EndBeforeStart,

    #[error("description is {len} characters, limit is {limit}")]
    DescriptionTooLong { len: usize, limit: usize },
}

impl EventFields {
    pub fn validate(&self, description_limit: usize) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let start = self.start.ok_or(ValidationError::MissingStart)?;

        if self.end.is_some_and(|end| end < start) {
            return Err(ValidationError::EndBeforeStart);
        }

        if let Some(description) = &self.description {
            let len = description.chars().count();
            if len > description_limit {
                return Err(ValidationError::DescriptionTooLong {
                    len,
                    limit: description_limit,
                });
            }
        }

        Ok(())
    }
}

/// An event record in the local catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: EventFields,
    #[serde(default)]
    pub approved: bool,
    pub editor: Actor,
    pub edit_comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(fields: EventFields, editor: Actor, now: DateTime<Utc>) -> Self {
        Event {
            id: Uuid::new_v4(),
            fields,
            approved: false,
            editor,
            edit_comment: None,
            updated_at: now,
        }
    }

    /// True once the event's start lies before `now`.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.fields.start.is_some_and(|start| start < now)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.title)
    }
}

/// Who a catalog write came from.
///
/// Writes tagged [`ChangeOrigin::Local`] mark the event's tracking links as
/// locally modified; sourcing writes never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    Sourcing,
    Local,
}

/// One version-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub event_id: Uuid,
    pub origin: ChangeOrigin,
    pub editor: Actor,
    pub comment: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub snapshot: Event,
}

impl Revision {
    pub fn of(event: &Event, origin: ChangeOrigin) -> Self {
        Revision {
            event_id: event.id,
            origin,
            editor: event.editor.clone(),
            comment: event.edit_comment.clone(),
            recorded_at: event.updated_at,
            snapshot: event.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fields() -> EventFields {
        EventFields {
            title: "Test".to_string(),
            start: Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_minimal_event() {
        assert_eq!(fields().validate(510), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_events() {
        let untitled = EventFields {
            title: "  ".to_string(),
            ..fields()
        };
        assert_eq!(untitled.validate(510), Err(ValidationError::MissingTitle));

        let no_start = EventFields {
            start: None,
            ..fields()
        };
        assert_eq!(no_start.validate(510), Err(ValidationError::MissingStart));

        let backwards = EventFields {
            end: fields().start.map(|s| s - Duration::hours(1)),
            ..fields()
        };
        assert_eq!(backwards.validate(510), Err(ValidationError::EndBeforeStart));

        let wordy = EventFields {
            description: Some("x".repeat(11)),
            ..fields()
        };
        assert_eq!(
            wordy.validate(10),
            Err(ValidationError::DescriptionTooLong { len: 11, limit: 10 })
        );
    }

    #[test]
    fn test_event_json_flattens_fields() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let event = Event::new(fields(), Actor::new("importer"), now);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["title"], "Test");
        assert_eq!(json["editor"], "importer");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
