//! Configuration loading and database path resolution
//!
//! Bootstrap settings come from a TOML file. Resolution order for the file:
//! 1. Command-line argument (highest priority)
//! 2. `COMPATH_CONFIG` environment variable
//! 3. `~/.config/compath/config.toml`, then `/etc/compath/config.toml`
//! 4. Compiled defaults (a missing file is not fatal)

use crate::model::ADMIN_EMAIL;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "COMPATH_CONFIG";

/// Environment variable naming the SQLite database file
pub const DATABASE_ENV_VAR: &str = "COMPATH_DATABASE";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP bind address for compath-web
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port for compath-web
    #[serde(default = "default_port")]
    pub port: u16,

    /// Fallback curator account
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Overrides the `vote_acceptance` setting stored in the database
    #[serde(default)]
    pub vote_acceptance: Option<i64>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceConfig>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            host: default_host(),
            port: default_port(),
            admin_email: default_admin_email(),
            vote_acceptance: None,
            logging: LoggingConfig::default(),
            import: ImportConfig::default(),
            resources: default_resources(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// What a bulk import does with a row that fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Abort the run on the first invalid row
    Strict,
    /// Log the row, record a warning and continue
    #[default]
    Lenient,
}

/// What a bulk import does with a curator email that has no account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CuratorPolicy {
    /// Curators must be registered with `make-user` beforehand
    #[default]
    Require,
    /// Create the account with a placeholder password and warn
    Provision,
}

/// Curation import settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub policy: ValidationPolicy,

    #[serde(default)]
    pub curator_policy: CuratorPolicy,

    /// Curator emails; empty means the admin email
    #[serde(default)]
    pub curators: Vec<String>,
}

/// One `[[resources]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,

    /// JSON catalog of the resource's pathways
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    #[serde(default)]
    pub has_hierarchy: bool,

    /// Restricts hierarchy loading to one species
    #[serde(default)]
    pub species: Option<String>,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: None,
            has_hierarchy: false,
            species: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_admin_email() -> String {
    ADMIN_EMAIL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_resources() -> Vec<ResourceConfig> {
    vec![
        ResourceConfig::new("kegg"),
        ResourceConfig {
            has_hierarchy: true,
            species: Some("Homo sapiens".to_string()),
            ..ResourceConfig::new("reactome")
        },
        ResourceConfig::new("wikipathways"),
        ResourceConfig::new("msig"),
    ]
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Resolve and load the config file, falling back to compiled defaults
    ///
    /// An explicitly requested file that cannot be parsed is an error; a
    /// missing one only produces a warning.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found; using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found; using compiled defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Locate the config file following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: User, then system config file
    let user_config = dirs::config_dir().map(|d| d.join("compath").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }
    let system_config = PathBuf::from("/etc/compath/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Resolve the SQLite database path
///
/// Priority: CLI argument, `COMPATH_DATABASE`, TOML `database_path`, then
/// `<data_local_dir>/compath/compath.db`.
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        return PathBuf::from(path);
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    default_database_path()
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("compath"))
        .unwrap_or_else(|| PathBuf::from("./compath_data"))
        .join("compath.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.import.policy, ValidationPolicy::Lenient);
        assert_eq!(config.import.curator_policy, CuratorPolicy::Require);
        assert_eq!(config.admin_email, ADMIN_EMAIL);
        assert!(config.import.curators.is_empty());

        let names: Vec<&str> = config.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["kegg", "reactome", "wikipathways", "msig"]);
        assert!(config.resources[1].has_hierarchy);
    }

    #[test]
    fn test_parse_full_config() {
        let config: TomlConfig = toml::from_str(
            r#"
            database_path = "/tmp/compath.db"
            port = 8080
            vote_acceptance = 5

            [logging]
            level = "debug"

            [import]
            policy = "strict"
            curator_policy = "provision"
            curators = ["a@example.org", "b@example.org"]

            [[resources]]
            name = "kegg"
            catalog = "catalogs/kegg.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/compath.db")));
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.vote_acceptance, Some(5));
        assert_eq!(config.import.policy, ValidationPolicy::Strict);
        assert_eq!(config.import.curator_policy, CuratorPolicy::Provision);
        assert_eq!(config.import.curators.len(), 2);
        assert_eq!(config.resources.len(), 1);
        assert!(!config.resources[0].has_hierarchy);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = toml::from_str::<TomlConfig>("[import]\npolicy = \"sometimes\"\n");
        assert!(result.is_err());
    }
}
