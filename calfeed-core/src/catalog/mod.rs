//! Storage contracts the importer writes through.
//!
//! The catalog owns sources, events and tracking links. The version log and
//! the approval policy are separate seams because in a larger deployment they
//! belong to other systems.

mod approvals;
mod file;
mod memory;

pub use approvals::StaticApprovals;
pub use file::FileCatalog;
pub use memory::MemoryCatalog;

use uuid::Uuid;

use crate::error::FeedResult;
use crate::event::{Actor, ChangeOrigin, Event, Revision};
use crate::link::TrackingLink;
use crate::source::Source;

pub trait Catalog {
    fn save_source(&mut self, source: &Source) -> FeedResult<()>;

    fn event(&self, id: Uuid) -> FeedResult<Option<Event>>;

    /// Insert or replace an event.
    ///
    /// Implementations must flag every active link to the event as locally
    /// modified when `origin` is [`ChangeOrigin::Local`].
    fn save_event(&mut self, event: &Event, origin: ChangeOrigin) -> FeedResult<()>;

    /// The most recently inserted link for this source and upstream identifier.
    ///
    /// Several links may share an identifier once it is reused for a new
    /// occurrence. Implementations must return the newest one, since the
    /// importer never retires the superseded links.
    fn find_link(&self, source_id: Uuid, external_id: &str) -> FeedResult<Option<TrackingLink>>;

    /// Insert or replace a link.
    fn save_link(&mut self, link: &TrackingLink) -> FeedResult<()>;
}

/// Append-only audit sink.
pub trait VersionLog {
    fn record(&mut self, revision: Revision) -> FeedResult<()>;
}

/// Capability check: may `actor` approve events in `area`?
pub trait ApprovalPolicy {
    fn can_approve(&self, actor: &Actor, area: &str) -> bool;
}
