//! In-memory catalog.

use uuid::Uuid;

use crate::catalog::{Catalog, VersionLog};
use crate::error::{FeedError, FeedResult};
use crate::event::{ChangeOrigin, Event, Revision};
use crate::link::TrackingLink;
use crate::source::Source;

/// Catalog held entirely in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    sources: Vec<Source>,
    events: Vec<Event>,
    links: Vec<TrackingLink>,
    history: Vec<Revision>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        sources: Vec<Source>,
        events: Vec<Event>,
        links: Vec<TrackingLink>,
    ) -> Self {
        MemoryCatalog {
            sources,
            events,
            links,
            history: Vec::new(),
        }
    }

    // SOURCES:

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn add_source(&mut self, source: Source) -> FeedResult<()> {
        if self.source(&source.name).is_some() {
            return Err(FeedError::SourceExists(source.name));
        }
        self.sources.push(source);
        Ok(())
    }

    /// Forget a source descriptor. Its links and events stay.
    pub fn remove_source(&mut self, name: &str) -> FeedResult<Source> {
        let pos = self
            .sources
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| FeedError::SourceNotFound(name.to_string()))?;
        Ok(self.sources.remove(pos))
    }

    // EVENTS + LINKS:

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn links(&self) -> &[TrackingLink] {
        &self.links
    }

    pub fn links_for(&self, source_id: Uuid) -> impl Iterator<Item = &TrackingLink> {
        self.links.iter().filter(move |l| l.source_id == source_id)
    }

    /// Revisions recorded since this catalog was created or last drained.
    pub fn history(&self) -> &[Revision] {
        &self.history
    }

    pub(crate) fn drain_history(&mut self) -> Vec<Revision> {
        std::mem::take(&mut self.history)
    }

    /// Apply `change` to the link whose id starts with `id_prefix`.
    pub fn update_link(
        &mut self,
        id_prefix: &str,
        change: impl FnOnce(&mut TrackingLink),
    ) -> FeedResult<TrackingLink> {
        let mut matching = self
            .links
            .iter_mut()
            .filter(|l| l.id.to_string().starts_with(id_prefix));

        let link = match (matching.next(), matching.next()) {
            (Some(link), None) if !id_prefix.is_empty() => link,
            (Some(_), Some(_)) => {
                return Err(FeedError::LinkNotFound(format!(
                    "{} (ambiguous prefix)",
                    id_prefix
                )));
            }
            _ => return Err(FeedError::LinkNotFound(id_prefix.to_string())),
        };

        change(link);
        Ok(link.clone())
    }
}

impl Catalog for MemoryCatalog {
    fn save_source(&mut self, source: &Source) -> FeedResult<()> {
        match self.sources.iter_mut().find(|s| s.id == source.id) {
            Some(existing) => *existing = source.clone(),
            None => self.sources.push(source.clone()),
        }
        Ok(())
    }

    fn event(&self, id: Uuid) -> FeedResult<Option<Event>> {
        Ok(self.events.iter().find(|e| e.id == id).cloned())
    }

    fn save_event(&mut self, event: &Event, origin: ChangeOrigin) -> FeedResult<()> {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event.clone(),
            None => self.events.push(event.clone()),
        }

        if origin == ChangeOrigin::Local {
            self.links
                .iter_mut()
                .filter(|l| l.event_id == Some(event.id))
                .for_each(|l| l.has_local_modifications = true);
        }

        Ok(())
    }

    fn find_link(&self, source_id: Uuid, external_id: &str) -> FeedResult<Option<TrackingLink>> {
        Ok(self
            .links
            .iter()
            .rev()
            .find(|l| l.matches(source_id, external_id))
            .cloned())
    }

    fn save_link(&mut self, link: &TrackingLink) -> FeedResult<()> {
        match self.links.iter_mut().find(|l| l.id == link.id) {
            Some(existing) => *existing = link.clone(),
            None => self.links.push(link.clone()),
        }
        Ok(())
    }
}

impl VersionLog for MemoryCatalog {
    fn record(&mut self, revision: Revision) -> FeedResult<()> {
        self.history.push(revision);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Actor, EventFields};
    use chrono::{TimeZone, Utc};

    fn event() -> Event {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Event::new(
            EventFields {
                title: "Test".to_string(),
                ..Default::default()
            },
            Actor::new("importer"),
            now,
        )
    }

    #[test]
    fn test_local_save_flags_links_but_sourcing_save_does_not() {
        let mut catalog = MemoryCatalog::new();
        let source = Source::new("town", "https://example.com/feed.ics");
        let event = event();
        let link = TrackingLink::active(source.id, Some("1@test".into()), event.id, event.updated_at);

        catalog.save_event(&event, ChangeOrigin::Sourcing).unwrap();
        catalog.save_link(&link).unwrap();
        catalog.save_event(&event, ChangeOrigin::Sourcing).unwrap();
        assert!(!catalog.links()[0].has_local_modifications);

        catalog.save_event(&event, ChangeOrigin::Local).unwrap();
        assert!(catalog.links()[0].has_local_modifications);
        assert_eq!(catalog.events().len(), 1);
    }

    #[test]
    fn test_find_link_returns_newest_match() {
        let mut catalog = MemoryCatalog::new();
        let source = Source::new("town", "https://example.com/feed.ics");
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let older = TrackingLink::active(source.id, Some("1@test".into()), Uuid::new_v4(), now);
        let newer = TrackingLink::active(source.id, Some("1@test".into()), Uuid::new_v4(), now);
        catalog.save_link(&older).unwrap();
        catalog.save_link(&newer).unwrap();

        let found = catalog.find_link(source.id, "1@test").unwrap().unwrap();
        assert_eq!(found.id, newer.id);
        assert!(catalog.find_link(Uuid::new_v4(), "1@test").unwrap().is_none());
    }

    #[test]
    fn test_update_link_by_prefix() {
        let mut catalog = MemoryCatalog::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let link = TrackingLink::active(Uuid::new_v4(), None, Uuid::new_v4(), now);
        catalog.save_link(&link).unwrap();

        let prefix = &link.id.to_string()[..8];
        let ignored = catalog.update_link(prefix, TrackingLink::ignore).unwrap();
        assert!(ignored.is_ignored());
        assert!(catalog.links()[0].is_ignored());

        assert!(matches!(
            catalog.update_link("zzzz", TrackingLink::ignore),
            Err(FeedError::LinkNotFound(_))
        ));
        assert!(catalog.update_link("", TrackingLink::ignore).is_err());
    }

    #[test]
    fn test_source_registry() {
        let mut catalog = MemoryCatalog::new();
        catalog.add_source(Source::new("town", "https://a")).unwrap();
        assert!(matches!(
            catalog.add_source(Source::new("town", "https://b")),
            Err(FeedError::SourceExists(_))
        ));
        assert_eq!(catalog.remove_source("town").unwrap().url, "https://a");
        assert!(catalog.sources().is_empty());
    }
}
