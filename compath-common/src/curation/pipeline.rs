//! Bulk curation import
//!
//! Rows are processed in file order. Every valid row is proposed once per
//! curator and then accepted, since curated files come from a trusted offline
//! review rather than community voting. Invalid rows either abort the run or
//! are skipped with a warning, depending on [`ValidationPolicy`]. Rows written
//! before an abort stay written.

use crate::config::{CuratorPolicy, ImportConfig, ValidationPolicy};
use crate::context::AppContext;
use crate::curation::source::read_source;
use crate::curation::statement::{ensure_syntax, parse_statement, statement_syntax_checker};
use crate::curation::tabular::{
    parse_special, parse_tabular, statement_cells, ParsedRow, SideSpec, Table,
};
use crate::db::mappings::{accept_mapping, get_or_create_mapping};
use crate::db::users::{get_user_by_email, provision_user, User};
use crate::model::PathwayReference;
use crate::registry::ResourceRegistry;
use crate::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

/// Layout of a curation file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurationFormat {
    /// `Source Resource`/`Source ID`/`Target Resource`/`Target ID`/`Mapping Type`
    Tabular,
    /// Tabular columns plus `Source Name`/`Target Name`
    Special,
    /// Free-text statements comparing two resources
    Statements {
        reference_resource: String,
        compared_resource: String,
        column: usize,
    },
}

/// Counts and warnings of one import run
///
/// An entry is one row of a tabular file or one statement of a statements
/// file, where a single line may carry several statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub entries_read: usize,
    pub mappings_created: usize,
    pub mappings_accepted: usize,
    pub entries_skipped: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    /// Fold another run's counts into this one
    pub fn merge(&mut self, other: ImportReport) {
        self.entries_read += other.entries_read;
        self.mappings_created += other.mappings_created;
        self.mappings_accepted += other.mappings_accepted;
        self.entries_skipped += other.entries_skipped;
        self.warnings.extend(other.warnings);
    }
}

/// Look up a curator account, provisioning it when the policy allows
pub async fn resolve_curator(pool: &SqlitePool, email: &str, policy: CuratorPolicy) -> Result<User> {
    if let Some(user) = get_user_by_email(pool, email).await? {
        return Ok(user);
    }

    match policy {
        CuratorPolicy::Require => Err(Error::CurationIdentityMissing(email.to_string())),
        CuratorPolicy::Provision => provision_user(pool, email).await,
    }
}

/// Drives parsed rows into the mapping store on behalf of a set of curators
pub struct CurationImporter<'a> {
    pool: &'a SqlitePool,
    registry: &'a ResourceRegistry,
    policy: ValidationPolicy,
    curators: Vec<User>,
}

impl<'a> CurationImporter<'a> {
    /// Resolve every curator up front so a missing account fails before any write
    ///
    /// At least one curator is required; [`AppContext::curator_emails`] supplies
    /// the configured admin account when no curators are configured.
    pub async fn new(
        pool: &'a SqlitePool,
        registry: &'a ResourceRegistry,
        import: &ImportConfig,
        curator_emails: &[String],
    ) -> Result<Self> {
        if curator_emails.is_empty() {
            return Err(Error::InvalidInput(
                "a curation import needs at least one curator".to_string(),
            ));
        }

        let mut curators = Vec::with_capacity(curator_emails.len());
        for email in curator_emails {
            curators.push(resolve_curator(pool, email, import.curator_policy).await?);
        }

        Ok(Self {
            pool,
            registry,
            policy: import.policy,
            curators,
        })
    }

    pub async fn from_context(ctx: &'a AppContext) -> Result<Self> {
        Self::new(&ctx.db, &ctx.registry, &ctx.import, &ctx.curator_emails()).await
    }

    pub fn curators(&self) -> &[User] {
        &self.curators
    }

    /// Import a local file or an `http(s)://` URL
    pub async fn import_source(&self, source: &str, format: &CurationFormat) -> Result<ImportReport> {
        let content = read_source(source).await?;
        let report = self.import_str(&content, format).await?;
        info!(
            "Imported {}: {} entries, {} mappings created, {} accepted, {} skipped",
            source,
            report.entries_read,
            report.mappings_created,
            report.mappings_accepted,
            report.entries_skipped
        );
        Ok(report)
    }

    pub async fn import_str(&self, content: &str, format: &CurationFormat) -> Result<ImportReport> {
        let table = Table::parse(content)?;

        let rows = match format {
            CurationFormat::Tabular => parse_tabular(&table)?,
            CurationFormat::Special => parse_special(&table)?,
            CurationFormat::Statements {
                reference_resource,
                compared_resource,
                column,
            } => self.statement_rows(&table, reference_resource, compared_resource, *column)?,
        };

        let mut report = ImportReport::default();
        for row in rows {
            self.import_row(row, &mut report).await?;
        }
        Ok(report)
    }

    /// Statement rows after the whole-file syntax check
    fn statement_rows(
        &self,
        table: &Table,
        reference_resource: &str,
        compared_resource: &str,
        column: usize,
    ) -> Result<Vec<ParsedRow>> {
        self.registry.ensure_registered(reference_resource)?;
        self.registry.ensure_registered(compared_resource)?;

        let cells = statement_cells(table, column);

        let problems = ensure_syntax(&cells);
        if !problems.is_empty() && self.policy == ValidationPolicy::Strict {
            for problem in &problems {
                error!("{}", problem);
            }
            return Err(Error::InvalidInput(format!(
                "{} statements failed the syntax check, first at {}",
                problems.len(),
                problems[0]
            )));
        }

        Ok(cells
            .into_iter()
            .map(|cell| {
                let candidate =
                    if statement_syntax_checker(&cell.statement, &cell.reference_pathway) {
                        parse_statement(&cell.statement, reference_resource, compared_resource)
                    } else {
                        Err(Error::InvalidInput(format!(
                            "problem with \"{}\" given the reference pathway \"{}\"",
                            cell.statement, cell.reference_pathway
                        )))
                    };
                ParsedRow {
                    line: cell.line,
                    candidate,
                }
            })
            .collect())
    }

    async fn import_row(&self, row: ParsedRow, report: &mut ImportReport) -> Result<()> {
        report.entries_read += 1;

        let resolved = row.candidate.and_then(|candidate| {
            let side_1 = self.resolve_side(&candidate.side_1)?;
            let side_2 = self.resolve_side(&candidate.side_2)?;
            if side_1 == side_2 {
                return Err(Error::InvalidInput(format!(
                    "cannot map {} to itself",
                    side_1
                )));
            }
            Ok((side_1, side_2, candidate.mapping_type))
        });

        let (side_1, side_2, mapping_type) = match resolved {
            Ok(resolved) => resolved,
            Err(e) if e.is_row_error() => return self.reject(row.line, e, report),
            Err(e) => return Err(e),
        };

        for curator in &self.curators {
            let (mapping, created) = get_or_create_mapping(
                self.pool,
                self.registry,
                side_1.clone(),
                side_2.clone(),
                mapping_type,
                curator.id,
            )
            .await?;
            if created {
                report.mappings_created += 1;
            }

            let (_, accepted) = accept_mapping(self.pool, mapping.id).await?;
            if accepted {
                report.mappings_accepted += 1;
            }
        }

        debug!("line {}: {} {} {}", row.line, side_1, mapping_type, side_2);
        Ok(())
    }

    /// Resolve a side by name (checking any given identifier) or by identifier
    fn resolve_side(&self, side: &SideSpec) -> Result<PathwayReference> {
        match (&side.name, &side.id) {
            (Some(name), expected_id) => {
                let reference = self.registry.resolve_by_name(&side.resource, name)?;
                if let Some(id) = expected_id {
                    if &reference.pathway_id != id {
                        return Err(Error::InvalidInput(format!(
                            "'{}' in '{}' has identifier '{}', not '{}'",
                            name, side.resource, reference.pathway_id, id
                        )));
                    }
                }
                Ok(reference)
            }
            (None, Some(id)) => self.registry.resolve_by_id(&side.resource, id),
            (None, None) => Err(Error::InvalidInput(format!(
                "no pathway given for '{}'",
                side.resource
            ))),
        }
    }

    fn reject(&self, line: usize, error: Error, report: &mut ImportReport) -> Result<()> {
        match self.policy {
            ValidationPolicy::Strict => {
                error!("line {}: {}", line, error);
                Err(error)
            }
            ValidationPolicy::Lenient => {
                warn!("Skipping line {}: {}", line, error);
                report.entries_skipped += 1;
                report.warnings.push(format!("line {}: {}", line, error));
                Ok(())
            }
        }
    }
}
