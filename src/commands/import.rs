use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;

use calfeed_core::event::Actor;
use calfeed_core::fetch::HttpFetcher;
use calfeed_core::import::{ImportContext, Importer};

use super::open_catalog;
use crate::render::{Render, ReportRender};
use crate::utils::tui::create_spinner;

pub async fn run(
    source_filter: Option<&str>,
    editor: Option<String>,
    approver: Option<String>,
    verbose: bool,
) -> Result<()> {
    let (config, mut catalog) = open_catalog()?;

    let mut sources = catalog.memory().sources().to_vec();
    if let Some(name) = source_filter {
        sources.retain(|s| s.name == name);
        if sources.is_empty() {
            let available: Vec<_> = catalog.memory().sources().iter().map(|s| s.name.clone()).collect();
            anyhow::bail!("Source '{}' not found. Available: {}", name, available.join(", "));
        }
    }

    if sources.is_empty() {
        anyhow::bail!(
            "No sources found.\n\n\
            Add your first feed with:\n  \
            calfeed source add <name> <url>"
        );
    }

    let approvals = config.approvals();
    let fetcher = HttpFetcher::new();
    let floating_tz = config.floating_timezone()?;
    let approver = approver.map(|a| Actor::new(&a)).or_else(|| config.approver());

    let mut created = 0;
    let mut updated = 0;
    let mut skipped = 0;
    let count = sources.len();

    for (i, source) in sources.iter_mut().enumerate() {
        let context = ImportContext::new(Utc::now(), config.fallback_editor())
            .with_editor(editor.as_deref().map(Actor::new))
            .with_approver(approver.clone())
            .with_description_limit(config.description_limit)
            .with_floating_timezone(floating_tz);

        let spinner = create_spinner(source.render());
        let result = Importer::new(&mut catalog, &approvals, context)
            .run(source, &fetcher)
            .await;
        spinner.finish_and_clear();

        println!("{}", source.render());

        match result {
            Ok(report) => {
                println!("{}", report.render(verbose, floating_tz));
                created += report.created.len();
                updated += report.updated.len();
                skipped += report.skipped.len();
            }
            Err(e) => println!("   {}", e.to_string().red()),
        }

        // Add spacing between sources (but not after the last one)
        if i + 1 < count {
            println!();
        }
    }

    // Only completed runs reach the catalog files
    catalog.save()?;

    println!(
        "\nImported {} created, {} updated, {} skipped",
        created, updated, skipped
    );

    Ok(())
}
