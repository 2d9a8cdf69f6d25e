//! ComPath command line interface
//!
//! Usage:
//!   compath ls                      - List registered resources
//!   compath populate                - Create the database schema
//!   compath drop [--yes]            - Drop every table
//!   compath delete-mappings [--yes] - Delete all mappings, votes and creators
//!   compath load-mappings SOURCE... - Import curated mapping files or URLs
//!   compath load-hierarchies        - Seed isPartOf mappings from resource trees
//!   compath make-user EMAIL PW      - Create a confirmed user
//!   compath make-admin EMAIL        - Grant the admin role
//!   compath mappings                - Print the mapping catalog
//!   compath export OUTPUT           - Write the catalog as TSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use compath_common::config::{resolve_database_path, TomlConfig};
use compath_common::curation::DEFAULT_STATEMENT_COLUMN;
use compath_common::AppContext;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "compath")]
#[command(about = "ComPath pathway mapping curation")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "COMPATH_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Curation file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Tabular,
    Special,
    Statements,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered resources
    Ls,

    /// Create the database schema
    Populate,

    /// Drop every table
    Drop {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete all mappings together with their votes and creators
    DeleteMappings {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Import curated mappings from files or http(s) URLs
    LoadMappings {
        /// Curation files or URLs
        #[arg(required = true)]
        sources: Vec<String>,

        #[arg(short, long, value_enum, default_value = "tabular")]
        format: FormatArg,

        /// Resource the statement file was curated from (statements format)
        #[arg(long)]
        reference: Option<String>,

        /// Resource the statements compare against (statements format)
        #[arg(long)]
        compared: Option<String>,

        /// Zero-based column holding the statements
        #[arg(long, default_value_t = DEFAULT_STATEMENT_COLUMN)]
        column: usize,

        /// Curator email; repeat for several curators
        #[arg(long = "curator")]
        curators: Vec<String>,

        /// Abort on the first invalid row
        #[arg(long, conflicts_with = "lenient")]
        strict: bool,

        /// Skip invalid rows with a warning
        #[arg(long)]
        lenient: bool,

        /// Create missing curator accounts instead of failing
        #[arg(long)]
        provision: bool,
    },

    /// Seed isPartOf mappings from resources with a native hierarchy
    LoadHierarchies {
        /// Curator email (defaults to the admin email)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create a confirmed user
    MakeUser { email: String, password: String },

    /// Grant the admin role to an existing user
    MakeAdmin { email: String },

    /// Print the mapping catalog
    Mappings {
        #[arg(long)]
        accepted_only: bool,
    },

    /// Write the mapping catalog as TSV
    Export {
        output: PathBuf,

        #[arg(long)]
        accepted_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TomlConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Logs go to stderr so command output can be piped
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = resolve_database_path(cli.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());

    let ctx = AppContext::from_config(&config, &db_path)
        .await
        .context("Failed to initialize application context")?;

    match cli.command {
        Commands::Ls => commands::list_resources(&ctx),
        Commands::Populate => commands::populate(&ctx).await,
        Commands::Drop { yes } => commands::drop_database(&ctx, yes).await,
        Commands::DeleteMappings { yes } => commands::delete_mappings(&ctx, yes).await,
        Commands::LoadMappings {
            sources,
            format,
            reference,
            compared,
            column,
            curators,
            strict,
            lenient,
            provision,
        } => {
            let format = commands::curation_format(format, reference, compared, column)?;
            let options = commands::LoadOptions {
                curators,
                strict,
                lenient,
                provision,
            };
            commands::load_mappings(&ctx, &sources, &format, options).await
        }
        Commands::LoadHierarchies { email } => commands::load_hierarchies(&ctx, email).await,
        Commands::MakeUser { email, password } => {
            commands::make_user(&ctx, &email, &password).await
        }
        Commands::MakeAdmin { email } => commands::make_admin(&ctx, &email).await,
        Commands::Mappings { accepted_only } => commands::print_mappings(&ctx, accepted_only).await,
        Commands::Export {
            output,
            accepted_only,
        } => commands::export(&ctx, &output, accepted_only).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load_mappings() {
        let cli = Cli::try_parse_from([
            "compath",
            "load-mappings",
            "a.tsv",
            "https://example.org/b.tsv",
            "--format",
            "statements",
            "--reference",
            "kegg",
            "--compared",
            "reactome",
            "--curator",
            "a@example.org",
            "--curator",
            "b@example.org",
            "--strict",
        ])
        .unwrap();

        match cli.command {
            Commands::LoadMappings {
                sources,
                format,
                column,
                curators,
                strict,
                lenient,
                ..
            } => {
                assert_eq!(sources.len(), 2);
                assert_eq!(format, FormatArg::Statements);
                assert_eq!(column, DEFAULT_STATEMENT_COLUMN);
                assert_eq!(curators, vec!["a@example.org", "b@example.org"]);
                assert!(strict);
                assert!(!lenient);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_strict_conflicts_with_lenient() {
        assert!(Cli::try_parse_from(["compath", "load-mappings", "a.tsv", "--strict", "--lenient"]).is_err());
        assert!(Cli::try_parse_from(["compath", "load-mappings"]).is_err());
    }

    #[test]
    fn test_global_database_flag() {
        let cli = Cli::try_parse_from(["compath", "mappings", "--accepted-only", "-d", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::Mappings { accepted_only: true }));
    }
}
