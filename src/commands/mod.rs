pub mod events;
pub mod import;
pub mod inspect;
pub mod links;
pub mod source;

use anyhow::{Context, Result};
use calfeed_core::catalog::FileCatalog;
use calfeed_core::config::CalfeedConfig;

/// Load the global config and open the catalog it points to.
fn open_catalog() -> Result<(CalfeedConfig, FileCatalog)> {
    let config = CalfeedConfig::load()?;
    let path = config.catalog_path();
    let catalog = FileCatalog::open(&path)
        .with_context(|| format!("Could not open catalog at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Opened catalog");
    Ok((config, catalog))
}
