//! Global calfeed configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::catalog::StaticApprovals;
use crate::error::{FeedError, FeedResult};
use crate::event::Actor;
use crate::import::DEFAULT_DESCRIPTION_LIMIT;

static DEFAULT_CATALOG_PATH: &str = "~/calfeed";
static DEFAULT_FALLBACK_EDITOR: &str = "importer";
static DEFAULT_TIMEZONE: &str = "UTC";

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}

fn default_fallback_editor() -> String {
    DEFAULT_FALLBACK_EDITOR.to_string()
}

fn default_description_limit() -> usize {
    DEFAULT_DESCRIPTION_LIMIT
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Global configuration at ~/.config/calfeed/config.toml
///
/// Every field can be overridden with a `CALFEED_`-prefixed environment
/// variable, e.g. `CALFEED_CATALOG_DIR`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CalfeedConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_dir: PathBuf,

    #[serde(default = "default_fallback_editor")]
    pub fallback_editor: String,

    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    /// IANA zone for floating times and all-day dates
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,

    /// Actor -> areas it may approve (`"*"` for all)
    #[serde(default)]
    pub approvals: HashMap<String, Vec<String>>,
}

impl Default for CalfeedConfig {
    fn default() -> Self {
        CalfeedConfig {
            catalog_dir: default_catalog_path(),
            fallback_editor: default_fallback_editor(),
            description_limit: default_description_limit(),
            default_timezone: default_timezone(),
            approver: None,
            approvals: HashMap::new(),
        }
    }
}

impl CalfeedConfig {
    pub fn config_path() -> FeedResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FeedError::Config("Could not determine config directory".into()))?
            .join("calfeed");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented default file first if needed.
    pub fn load() -> FeedResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> FeedResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CALFEED").try_parsing(true))
            .build()
            .map_err(|e| FeedError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FeedError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> FeedResult<()> {
        let contents = format!(
            "\
# calfeed configuration

# Where sources, events and tracking links are stored:
# catalog_dir = \"{}\"

# Editor credited for imports when none is given on the command line:
# fallback_editor = \"{}\"

# Longest description kept before the rest moves to content:
# description_limit = {}

# Zone for feed times without one:
# default_timezone = \"{}\"

# Actor whose approval rights decide auto-approval of new events:
# approver = \"editor\"

# Areas each actor may approve (\"*\" for all):
# [approvals]
# editor = [\"events\"]
",
            DEFAULT_CATALOG_PATH,
            DEFAULT_FALLBACK_EDITOR,
            DEFAULT_DESCRIPTION_LIMIT,
            DEFAULT_TIMEZONE
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FeedError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FeedError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Save the current config to `path`.
    pub fn save(&self, path: &Path) -> FeedResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| FeedError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| FeedError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.catalog_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn floating_timezone(&self) -> FeedResult<Tz> {
        self.default_timezone.parse::<Tz>().map_err(|_| {
            FeedError::Config(format!("Unknown timezone '{}'", self.default_timezone))
        })
    }

    pub fn fallback_editor(&self) -> Actor {
        Actor::new(&self.fallback_editor)
    }

    pub fn approver(&self) -> Option<Actor> {
        self.approver.as_deref().map(Actor::new)
    }

    pub fn approvals(&self) -> StaticApprovals {
        StaticApprovals::new(self.approvals.clone())
    }
}
