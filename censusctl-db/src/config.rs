use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::ConnectOptions;
use tracing::{debug, info, warn};

use crate::db::ValueLogging;

pub const ENV_DB_HOST: &str = "CENSUSCTL_DB_HOST";
pub const ENV_DB_PORT: &str = "CENSUSCTL_DB_PORT";
pub const ENV_DB_NAME: &str = "CENSUSCTL_DB_NAME";
pub const ENV_DB_USER: &str = "CENSUSCTL_DB_USER";
pub const ENV_DB_PASSWORD: &str = "CENSUSCTL_DB_PASSWORD";
pub const ENV_LOG_VALUES: &str = "CENSUSCTL_LOG_VALUES";

/// Load environment variables from .env files
///
/// Priority order (highest to lowest):
/// 1. Current directory .env
/// 2. ~/.censusctl/.env
/// 3. Environment variables already set
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(format!("current directory ({})", path.display()));
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            // dotenvy never overwrites variables that are already set
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(format!("~/.censusctl/.env ({})", env_file.display())),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.censusctl)");
    } else {
        info!("Loaded environment from: {}", loaded_from.join(", "));
    }
}

/// Get the censusctl config directory path (~/.censusctl)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".censusctl"))
}

// ============================================================================
// TOML Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CensusConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_charset")]
    pub charset: String,

    /// The DAL is written for a single shared session; raise only for
    /// callers that synchronise externally.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            user: default_user(),
            password: String::new(),
            charset: default_charset(),
            max_connections: default_max_connections(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("charset", &self.charset)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// sqlx connect options. Driver-level statement logging is disabled,
    /// the executor logs every statement itself.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .charset(&self.charset);

        let options = if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        };

        options.disable_statement_logging()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoggingConfig {
    /// How bound statement values appear in logs.
    #[serde(default)]
    pub values: ValueLogging,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_database() -> String {
    "appcensus".to_string()
}

fn default_user() -> String {
    "appcensus".to_string()
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

fn default_max_connections() -> u32 {
    1
}

impl CensusConfig {
    /// Load config from TOML files and the environment
    ///
    /// Priority order (highest to lowest):
    /// 1. CENSUSCTL_* environment variables (after .env loading)
    /// 2. ./censusctl.toml (project-specific)
    /// 3. ~/.censusctl/config.toml (user defaults)
    /// 4. Built-in defaults
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn load() -> Self {
        load_dotenv();

        let mut paths = Vec::new();
        if let Some(dir) = config_dir() {
            paths.push(dir.join("config.toml"));
        }
        paths.push(PathBuf::from("censusctl.toml"));

        let mut config = Self::load_files(&paths);
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Merge the given TOML files in order (later files win, key by key).
    pub fn load_files(paths: &[PathBuf]) -> Self {
        let mut merged = toml::Table::new();

        for path in paths {
            if let Some(table) = read_table(path) {
                merge_tables(&mut merged, table);
            }
        }

        match toml::Value::Table(merged).try_into::<CensusConfig>() {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid censusctl configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply `CENSUSCTL_*` overrides through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let db = &mut self.database;

        if let Some(host) = lookup(ENV_DB_HOST) {
            db.host = host;
        }
        if let Some(port) = lookup(ENV_DB_PORT) {
            match port.parse() {
                Ok(port) => db.port = port,
                Err(_) => warn!("Ignoring {}={}: not a port number", ENV_DB_PORT, port),
            }
        }
        if let Some(name) = lookup(ENV_DB_NAME) {
            db.database = name;
        }
        if let Some(user) = lookup(ENV_DB_USER) {
            db.user = user;
        }
        if let Some(password) = lookup(ENV_DB_PASSWORD) {
            db.password = password;
        }
        if let Some(values) = lookup(ENV_LOG_VALUES) {
            match values.parse() {
                Ok(policy) => self.logging.values = policy,
                Err(e) => warn!("Ignoring {}: {}", ENV_LOG_VALUES, e),
            }
        }
    }
}

fn read_table(path: &Path) -> Option<toml::Table> {
    if !path.exists() {
        return None;
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    match contents.parse::<toml::Table>() {
        Ok(table) => {
            debug!("Loaded config from {}", path.display());
            Some(table)
        }
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

/// Recursive merge, `overlay` wins on conflicting keys.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
