//! Subcommand implementations
//!
//! Each command runs against an [`AppContext`] built by `main`. Results are
//! printed to stdout; progress and warnings go through tracing.

use anyhow::{bail, Context, Result};
use compath_common::config::{CuratorPolicy, ValidationPolicy};
use compath_common::curation::{resolve_curator, CurationFormat, CurationImporter, ImportReport};
use compath_common::db::init::{create_schema, drop_schema};
use compath_common::db::mappings::{delete_all_mappings, list_mapping_summaries, MappingFilter};
use compath_common::db::users;
use compath_common::export::export_mappings;
use compath_common::hierarchy;
use compath_common::AppContext;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::FormatArg;

/// Command-line overrides of the configured import policy
#[derive(Debug, Default)]
pub struct LoadOptions {
    pub curators: Vec<String>,
    pub strict: bool,
    pub lenient: bool,
    pub provision: bool,
}

pub fn list_resources(ctx: &AppContext) -> Result<()> {
    for resource in ctx.registry.resources() {
        let hierarchy = if resource.has_hierarchy { " (hierarchy)" } else { "" };
        println!("{}\t{}{}", resource.name, resource.styled_name, hierarchy);
    }
    Ok(())
}

pub async fn populate(ctx: &AppContext) -> Result<()> {
    create_schema(&ctx.db).await?;
    println!("Schema is up to date");
    Ok(())
}

pub async fn drop_database(ctx: &AppContext, yes: bool) -> Result<()> {
    if !yes && !confirm("Drop every ComPath table?")? {
        println!("Aborted");
        return Ok(());
    }
    drop_schema(&ctx.db).await?;
    println!("Dropped database");
    Ok(())
}

pub async fn delete_mappings(ctx: &AppContext, yes: bool) -> Result<()> {
    if !yes && !confirm("Delete all mappings, votes and creators?")? {
        println!("Aborted");
        return Ok(());
    }
    let deleted = delete_all_mappings(&ctx.db).await?;
    println!("Deleted {} mappings", deleted);
    Ok(())
}

/// Build the curation format from the `load-mappings` flags
pub fn curation_format(
    format: FormatArg,
    reference: Option<String>,
    compared: Option<String>,
    column: usize,
) -> Result<CurationFormat> {
    Ok(match format {
        FormatArg::Tabular => CurationFormat::Tabular,
        FormatArg::Special => CurationFormat::Special,
        FormatArg::Statements => match (reference, compared) {
            (Some(reference_resource), Some(compared_resource)) => CurationFormat::Statements {
                reference_resource,
                compared_resource,
                column,
            },
            _ => bail!("--reference and --compared are required for the statements format"),
        },
    })
}

pub async fn load_mappings(
    ctx: &AppContext,
    sources: &[String],
    format: &CurationFormat,
    options: LoadOptions,
) -> Result<()> {
    let report = import_sources(ctx, sources, format, options).await?;

    println!(
        "{} entries read, {} mappings created, {} accepted, {} entries skipped",
        report.entries_read, report.mappings_created, report.mappings_accepted, report.entries_skipped
    );
    for warning in &report.warnings {
        println!("  skipped {}", warning);
    }
    Ok(())
}

async fn import_sources(
    ctx: &AppContext,
    sources: &[String],
    format: &CurationFormat,
    options: LoadOptions,
) -> Result<ImportReport> {
    let mut import = ctx.import.clone();
    if options.strict {
        import.policy = ValidationPolicy::Strict;
    } else if options.lenient {
        import.policy = ValidationPolicy::Lenient;
    }
    if options.provision {
        import.curator_policy = CuratorPolicy::Provision;
    }

    let curators = if options.curators.is_empty() {
        ctx.curator_emails()
    } else {
        options.curators
    };

    let importer = CurationImporter::new(&ctx.db, &ctx.registry, &import, &curators).await?;

    let mut report = ImportReport::default();
    for source in sources {
        let part = importer
            .import_source(source, format)
            .await
            .with_context(|| format!("Import of {} failed", source))?;
        report.merge(part);
    }
    Ok(report)
}

pub async fn load_hierarchies(ctx: &AppContext, email: Option<String>) -> Result<()> {
    let email = email.unwrap_or_else(|| ctx.admin_email.clone());
    let curator = resolve_curator(&ctx.db, &email, ctx.import.curator_policy).await?;

    let report = hierarchy::load_hierarchies(&ctx.db, &ctx.registry, curator.id).await?;
    if report.resources.is_empty() {
        warn!("No registered resource has a hierarchy");
    }
    println!(
        "{} pathways visited in [{}]: {} mappings created, {} already present",
        report.pathways_visited,
        report.resources.join(", "),
        report.mappings_created,
        report.mappings_existing
    );
    Ok(())
}

pub async fn make_user(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let (user, created) = users::make_user(&ctx.db, email, password).await?;
    if created {
        println!("Created user {} (id {})", user.email, user.id);
    } else {
        println!("User {} already exists (id {})", user.email, user.id);
    }
    Ok(())
}

pub async fn make_admin(ctx: &AppContext, email: &str) -> Result<()> {
    let user = users::make_admin(&ctx.db, email).await?;
    println!("{} is an administrator", user.email);
    Ok(())
}

pub async fn print_mappings(ctx: &AppContext, accepted_only: bool) -> Result<()> {
    let filter = if accepted_only {
        MappingFilter::accepted_only()
    } else {
        MappingFilter::default()
    };

    for summary in list_mapping_summaries(&ctx.db, &filter).await? {
        let mapping = &summary.mapping;
        println!(
            "{}\t{}\t{}\t{}\t{}\t+{}/-{}",
            mapping.id,
            mapping.side_1,
            mapping.mapping_type,
            mapping.side_2,
            if mapping.accepted { "accepted" } else { "pending" },
            summary.up_votes,
            summary.down_votes
        );
    }
    Ok(())
}

pub async fn export(ctx: &AppContext, output: &Path, accepted_only: bool) -> Result<()> {
    let tsv = export_mappings(&ctx.db, accepted_only).await?;
    tokio::fs::write(output, &tsv)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Exported {} mappings to {}", tsv.lines().count(), output.display());
    println!("Wrote {}", output.display());
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
