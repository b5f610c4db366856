//! Tracking links between upstream items and local events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Associates one upstream identifier, for one source, with at most one
/// local event.
///
/// A link without an event is "ignored": the importer skips its item from
/// then on. Links are never deleted by the importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingLink {
    pub id: Uuid,
    pub source_id: Uuid,
    /// The upstream UID; `None` for items that carried none
    pub external_id: Option<String>,
    pub event_id: Option<Uuid>,
    pub last_sourced_at: DateTime<Utc>,
    /// Set by the catalog whenever the event is saved outside an import
    #[serde(default)]
    pub has_local_modifications: bool,
}

impl TrackingLink {
    pub fn active(
        source_id: Uuid,
        external_id: Option<String>,
        event_id: Uuid,
        sourced_at: DateTime<Utc>,
    ) -> Self {
        TrackingLink {
            id: Uuid::new_v4(),
            source_id,
            external_id,
            event_id: Some(event_id),
            last_sourced_at: sourced_at,
            has_local_modifications: false,
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.event_id.is_none()
    }

    /// Detach the event; the upstream item will be skipped from now on.
    pub fn ignore(&mut self) {
        self.event_id = None;
        self.has_local_modifications = false;
    }

    /// Let automated updates through again after a local edit.
    pub fn clear_local_modifications(&mut self) {
        self.has_local_modifications = false;
    }

    pub fn matches(&self, source_id: Uuid, external_id: &str) -> bool {
        self.source_id == source_id && self.external_id.as_deref() == Some(external_id)
    }
}
