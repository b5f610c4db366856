//! Import runs: fetch a source, parse it, reconcile every item against the catalog.
//!
//! Each upstream event lands in exactly one bucket of the [`ImportReport`].
//! Items refused by reconciliation are skipped with a [`SkipReason`] and never
//! abort the run. Only fetch and catalog failures do.

mod mapping;
mod split;

pub use mapping::{map_event, organizer_name};
pub use split::{DEFAULT_DESCRIPTION_LIMIT, split_description, strip_trailing_url};

use std::fmt;
use std::io::BufRead;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::catalog::{ApprovalPolicy, Catalog, VersionLog};
use crate::error::FeedResult;
use crate::event::{Actor, ChangeOrigin, Event, EventFields, Revision, ValidationError};
use crate::fetch::Fetcher;
use crate::ics::{CalendarNode, EventNode, parse_reader};
use crate::link::TrackingLink;
use crate::source::Source;

/// Everything a run needs besides the catalog. Nothing is read from globals.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub now: DateTime<Utc>,
    pub editor: Option<Actor>,
    pub fallback_editor: Actor,
    /// Actor whose approval capability decides auto-approval of new events
    pub approver: Option<Actor>,
    pub description_limit: usize,
    /// Zone for floating times and all-day dates
    pub floating_tz: Tz,
}

impl ImportContext {
    pub fn new(now: DateTime<Utc>, fallback_editor: Actor) -> Self {
        ImportContext {
            now,
            editor: None,
            fallback_editor,
            approver: None,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            floating_tz: Tz::UTC,
        }
    }

    pub fn with_editor(mut self, editor: Option<Actor>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_approver(mut self, approver: Option<Actor>) -> Self {
        self.approver = approver;
        self
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    pub fn with_floating_timezone(mut self, tz: Tz) -> Self {
        self.floating_tz = tz;
        self
    }

    /// The supplied editor, or the fallback.
    pub fn editor(&self) -> &Actor {
        self.editor.as_ref().unwrap_or(&self.fallback_editor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The link was marked ignored by an operator
    Ignored,
    /// The event was edited locally since it was last sourced
    LocallyModified,
    /// Mapping the item produced exactly the stored event
    Unchanged,
    Invalid(ValidationError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ignored => write!(f, "ignored"),
            SkipReason::LocallyModified => write!(f, "locally modified"),
            SkipReason::Unchanged => write!(f, "unchanged"),
            SkipReason::Invalid(err) => write!(f, "invalid: {}", err),
        }
    }
}

/// An upstream item the run did not write.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub reason: SkipReason,
    pub item: EventNode,
    pub link: Option<TrackingLink>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub created: Vec<Event>,
    pub updated: Vec<Event>,
    pub skipped: Vec<Skipped>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.skipped.len()
    }

    fn skip(&mut self, reason: SkipReason, item: EventNode, link: Option<TrackingLink>) {
        debug!(uid = item.uid().unwrap_or("-"), reason = %reason, "Skipped item");
        self.skipped.push(Skipped { reason, item, link });
    }
}

pub struct Importer<'a, C, A> {
    catalog: &'a mut C,
    approvals: &'a A,
    context: ImportContext,
}

impl<'a, C, A> Importer<'a, C, A>
where
    C: Catalog + VersionLog,
    A: ApprovalPolicy,
{
    pub fn new(catalog: &'a mut C, approvals: &'a A, context: ImportContext) -> Self {
        Importer {
            catalog,
            approvals,
            context,
        }
    }

    /// Fetch the source and import it.
    ///
    /// A fetch failure returns before anything is written.
    pub async fn run<F: Fetcher>(
        &mut self,
        source: &mut Source,
        fetcher: &F,
    ) -> FeedResult<ImportReport> {
        info!(source = %source.name, url = %source.url, "Fetching feed");
        let bytes = fetcher.fetch(&source.url, source.method).await?;
        self.import_feed(source, bytes.as_slice())
    }

    pub fn import_feed<R: BufRead>(
        &mut self,
        source: &mut Source,
        reader: R,
    ) -> FeedResult<ImportReport> {
        let calendars = parse_reader(reader);
        self.import_calendars(source, calendars)
    }

    pub fn import_calendars(
        &mut self,
        source: &mut Source,
        calendars: Vec<CalendarNode>,
    ) -> FeedResult<ImportReport> {
        let mut report = ImportReport::default();

        for item in calendars.into_iter().flat_map(|calendar| calendar.events) {
            self.reconcile(source, item, &mut report)?;
        }

        source.last_refreshed_at = Some(self.context.now);
        self.catalog.save_source(source)?;

        info!(
            source = %source.name,
            created = report.created.len(),
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            "Import finished"
        );

        Ok(report)
    }

    fn reconcile(
        &mut self,
        source: &Source,
        item: EventNode,
        report: &mut ImportReport,
    ) -> FeedResult<()> {
        let fields = map_event(&item, &self.context);

        let link = match item.uid() {
            Some(uid) => self.catalog.find_link(source.id, uid)?,
            None => None,
        };

        if let Some(link) = link {
            let Some(event_id) = link.event_id else {
                report.skip(SkipReason::Ignored, item, Some(link));
                return Ok(());
            };

            if let Some(event) = self.catalog.event(event_id)? {
                if !self.is_reused_identifier(&event, &fields) {
                    return self.update(source, item, fields, link, event, report);
                }
                debug!(uid = item.uid().unwrap_or("-"), "Identifier reused for a future occurrence");
            }
        }

        self.create(source, item, fields, report)
    }

    /// The linked event already happened but the item now points to the future.
    fn is_reused_identifier(&self, event: &Event, fields: &EventFields) -> bool {
        let now = self.context.now;
        event.has_started(now) && fields.start.is_some_and(|start| start > now)
    }

    fn update(
        &mut self,
        source: &Source,
        item: EventNode,
        fields: EventFields,
        mut link: TrackingLink,
        mut event: Event,
        report: &mut ImportReport,
    ) -> FeedResult<()> {
        if link.has_local_modifications {
            report.skip(SkipReason::LocallyModified, item, Some(link));
            return Ok(());
        }

        if event.fields == fields {
            report.skip(SkipReason::Unchanged, item, Some(link));
            return Ok(());
        }

        if let Err(err) = fields.validate(self.context.description_limit) {
            report.skip(SkipReason::Invalid(err), item, Some(link));
            return Ok(());
        }

        event.fields = fields;
        event.editor = self.context.editor().clone();
        event.edit_comment = Some(format!("Updated from {}", source.name));
        event.updated_at = self.context.now;

        self.catalog.save_event(&event, ChangeOrigin::Sourcing)?;
        self.catalog.record(Revision::of(&event, ChangeOrigin::Sourcing))?;

        link.last_sourced_at = self.context.now;
        self.catalog.save_link(&link)?;

        debug!(uid = item.uid().unwrap_or("-"), event = %event.id, "Updated event");
        report.updated.push(event);
        Ok(())
    }

    fn create(
        &mut self,
        source: &Source,
        item: EventNode,
        fields: EventFields,
        report: &mut ImportReport,
    ) -> FeedResult<()> {
        if let Err(err) = fields.validate(self.context.description_limit) {
            report.skip(SkipReason::Invalid(err), item, None);
            return Ok(());
        }

        let mut event = Event::new(fields, self.context.editor().clone(), self.context.now);
        event.approved = self
            .context
            .approver
            .as_ref()
            .is_some_and(|approver| self.approvals.can_approve(approver, &source.area));
        event.edit_comment = Some(format!("Imported from {}", source.name));

        self.catalog.save_event(&event, ChangeOrigin::Sourcing)?;
        self.catalog.record(Revision::of(&event, ChangeOrigin::Sourcing))?;

        let sourced_at = source.last_refreshed_at.unwrap_or(self.context.now);
        let link = TrackingLink::active(
            source.id,
            item.uid().map(String::from),
            event.id,
            sourced_at,
        );
        self.catalog.save_link(&link)?;

        debug!(uid = item.uid().unwrap_or("-"), event = %event.id, "Created event");
        report.created.push(event);
        Ok(())
    }
}
