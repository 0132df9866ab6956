//! Runtime configuration.
//!
//! Precedence: CLI > env > config files > defaults. Config files are TOML and
//! are looked up at `--config`, `$VISA_CONFIG`, `<user config dir>/visa-navigator.toml`
//! and `./visa-navigator.toml`; the first file that sets a field wins.
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_HOST: &str = "cluster0.koweo.mongodb.net";
pub const DEFAULT_DB_NAME: &str = "VisaDB";
pub const DEFAULT_APP_NAME: &str = "Cluster0";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const CONFIG_FILE_NAME: &str = "visa-navigator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DB_USER and DB_PASSWORD must be set to use the mongo store")]
    MissingCredentials,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mongo,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue { key: "VISA_STORE", value: s.to_string() }),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mongo => "mongo",
            Self::Memory => "memory",
        })
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "visa-navigator", version, about = "Visa Navigator HTTP backend", long_about = None)]
pub struct CliArgs {
    #[arg(long, help = "Path to a config file (TOML)")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Port to listen on; overrides PORT")]
    pub port: Option<u16>,
    #[arg(long, value_enum, help = "Document store backend; overrides VISA_STORE")]
    pub store: Option<StoreKind>,
    #[arg(long, help = "MongoDB cluster host; overrides VISA_DB_HOST")]
    pub db_host: Option<String>,
    #[arg(long, help = "Log level: error|warn|info|debug|trace")]
    pub log_level: Option<String>,
    #[arg(long, help = "Directory for rolling log files; console only if omitted")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    port: Option<u16>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_host: Option<String>,
    db_name: Option<String>,
    app_name: Option<String>,
    store: Option<StoreKind>,
    log_level: Option<String>,
    log_dir: Option<PathBuf>,
}

impl FileConfig {
    fn merge(&mut self, other: Self) {
        self.port = self.port.or(other.port);
        self.db_user = self.db_user.take().or(other.db_user);
        self.db_password = self.db_password.take().or(other.db_password);
        self.db_host = self.db_host.take().or(other.db_host);
        self.db_name = self.db_name.take().or(other.db_name);
        self.app_name = self.app_name.take().or(other.app_name);
        self.store = self.store.or(other.store);
        self.log_level = self.log_level.take().or(other.log_level);
        self.log_dir = self.log_dir.take().or(other.log_dir);
    }
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub db_user: Option<String>,
    pub db_password: Option<Zeroizing<String>>,
    pub db_host: String,
    pub db_name: String,
    pub app_name: String,
    pub store: StoreKind,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("db_user", &self.db_user)
            .field("db_password", &self.db_password.as_ref().map(|_| "***"))
            .field("db_host", &self.db_host)
            .field("db_name", &self.db_name)
            .field("app_name", &self.app_name)
            .field("store", &self.store)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl Config {
    /// Load configuration from CLI arguments, the process environment and config files.
    ///
    /// # Errors
    /// Returns an error if a config file cannot be read or parsed, or a value is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        Self::load_with(cli, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup.
    ///
    /// # Errors
    /// Returns an error if a config file cannot be read or parsed, or a value is invalid.
    pub fn load_with<F>(cli: &CliArgs, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let file = read_files(cli, &var)?;

        let port = match (cli.port, var("PORT")) {
            (Some(p), _) => p,
            (None, Some(s)) => s
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: s.clone() })?,
            (None, None) => file.port.unwrap_or(DEFAULT_PORT),
        };
        let store = match (cli.store, var("VISA_STORE")) {
            (Some(s), _) => s,
            (None, Some(s)) => s.parse()?,
            (None, None) => file.store.unwrap_or_default(),
        };
        let log_level = cli
            .log_level
            .clone()
            .or_else(|| var("VISA_LOG_LEVEL"))
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            port,
            db_user: var("DB_USER").or(file.db_user),
            db_password: var("DB_PASSWORD").or(file.db_password).map(Zeroizing::new),
            db_host: cli
                .db_host
                .clone()
                .or_else(|| var("VISA_DB_HOST"))
                .or(file.db_host)
                .unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            db_name: var("VISA_DB_NAME")
                .or(file.db_name)
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            app_name: var("VISA_APP_NAME")
                .or(file.app_name)
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            store,
            log_level,
            log_dir: cli.log_dir.clone().or_else(|| var("VISA_LOG_DIR").map(PathBuf::from)).or(file.log_dir),
        })
    }

    /// The `mongodb+srv` connection string for the configured cluster.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingCredentials` if user or password is unset.
    pub fn connection_uri(&self) -> Result<Zeroizing<String>, ConfigError> {
        match (&self.db_user, &self.db_password) {
            (Some(user), Some(password)) => Ok(Zeroizing::new(format!(
                "mongodb+srv://{user}:{}@{}/?retryWrites=true&w=majority&appName={}",
                password.as_str(),
                self.db_host,
                self.app_name
            ))),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn read_files<F>(cli: &CliArgs, var: &F) -> Result<FileConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = FileConfig::default();
    // Explicitly named files must exist.
    let explicit = cli.config.clone().into_iter().chain(var("VISA_CONFIG").map(PathBuf::from));
    for path in explicit {
        merged.merge(read_file(path)?);
    }
    let implicit = dirs_next::config_dir()
        .map(|d| d.join(CONFIG_FILE_NAME))
        .into_iter()
        .chain(std::env::current_dir().ok().map(|d| d.join(CONFIG_FILE_NAME)));
    for path in implicit {
        if path.is_file() {
            merged.merge(read_file(path)?);
        }
    }
    Ok(merged)
}

fn read_file(path: PathBuf) -> Result<FileConfig, ConfigError> {
    let text = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
}
