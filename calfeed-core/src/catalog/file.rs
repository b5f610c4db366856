//! JSON-file catalog.
//!
//! Layout of a catalog directory:
//!
//! ```text
//! sources.json    source descriptors
//! events.json     event records
//! links.json      tracking links
//! history.jsonl   version log, one revision per line (append-only)
//! ```
//!
//! Everything is loaded into a [`MemoryCatalog`] on open and only written
//! back by [`FileCatalog::save`], so an aborted import leaves the files as
//! they were.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::catalog::{Catalog, MemoryCatalog, VersionLog};
use crate::error::FeedResult;
use crate::event::{ChangeOrigin, Event, Revision};
use crate::link::TrackingLink;
use crate::source::Source;

const SOURCES_FILE: &str = "sources.json";
const EVENTS_FILE: &str = "events.json";
const LINKS_FILE: &str = "links.json";
const HISTORY_FILE: &str = "history.jsonl";

pub struct FileCatalog {
    dir: PathBuf,
    memory: MemoryCatalog,
}

impl FileCatalog {
    pub fn open(dir: &Path) -> FeedResult<Self> {
        let sources = read_json(&dir.join(SOURCES_FILE))?;
        let events = read_json(&dir.join(EVENTS_FILE))?;
        let links = read_json(&dir.join(LINKS_FILE))?;

        Ok(FileCatalog {
            dir: dir.to_path_buf(),
            memory: MemoryCatalog::from_parts(sources, events, links),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn memory(&self) -> &MemoryCatalog {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryCatalog {
        &mut self.memory
    }

    /// Write all records back and append pending revisions to the history.
    pub fn save(&mut self) -> FeedResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        write_json(&self.dir.join(SOURCES_FILE), self.memory.sources())?;
        write_json(&self.dir.join(EVENTS_FILE), self.memory.events())?;
        write_json(&self.dir.join(LINKS_FILE), self.memory.links())?;

        let revisions = self.memory.drain_history();
        if !revisions.is_empty() {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.dir.join(HISTORY_FILE))?;
            for revision in &revisions {
                writeln!(file, "{}", serde_json::to_string(revision)?)?;
            }
        }

        Ok(())
    }
}

impl Catalog for FileCatalog {
    fn save_source(&mut self, source: &Source) -> FeedResult<()> {
        self.memory.save_source(source)
    }

    fn event(&self, id: Uuid) -> FeedResult<Option<Event>> {
        self.memory.event(id)
    }

    fn save_event(&mut self, event: &Event, origin: ChangeOrigin) -> FeedResult<()> {
        self.memory.save_event(event, origin)
    }

    fn find_link(&self, source_id: Uuid, external_id: &str) -> FeedResult<Option<TrackingLink>> {
        self.memory.find_link(source_id, external_id)
    }

    fn save_link(&mut self, link: &TrackingLink) -> FeedResult<()> {
        self.memory.save_link(link)
    }
}

impl VersionLog for FileCatalog {
    fn record(&mut self, revision: Revision) -> FeedResult<()> {
        self.memory.record(revision)
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> FeedResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write via a temp file and rename so readers never see a partial file.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> FeedResult<()> {
    let temp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
