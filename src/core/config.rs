use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. Without one the in-memory store is used.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    #[serde(default = "default_strict_geojson")]
    pub strict_geojson: bool,
    /// Files older than this are removed by the sweep task
    pub retention_secs: Option<u64>,
    /// Upper bound for the whole upload directory, oldest files go first
    pub max_total_bytes: Option<u64>,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

// Default value functions
fn default_port() -> u16 {
    3001
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_max_connections() -> u32 {
    5
}

fn default_token_ttl() -> i64 {
    3600 // 1 hour
}

fn default_argon2_memory_kib() -> u32 {
    19_456
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_strict_geojson() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            num_threads: default_num_threads(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

// Keeps the signing secret out of startup logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .field("argon2_parallelism", &self.argon2_parallelism)
            .finish()
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_file_size: default_max_file_size(),
            strict_geojson: default_strict_geojson(),
            retention_secs: None,
            max_total_bytes: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

impl UploadConfig {
    /// Whether any retention rule is configured
    pub fn has_retention(&self) -> bool {
        self.retention_secs.is_some() || self.max_total_bytes.is_some()
    }
}

impl Config {
    /// Load configuration: the TOML file if it exists, then environment
    /// overrides (including a `.env` file), then validation.
    pub fn load(path: &Path) -> Result<Self> {
        // A missing .env is fine, everything has a default or a TOML value
        let _ = dotenvy::dotenv();

        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply `PORT`, `DATABASE_URL`, `JWT_SECRET` and `UPLOAD_DIR` overrides
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .context(format!("Invalid PORT value '{}'", port))?;
        }

        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(url);
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.database.max_connections == 0 {
            bail!("max_connections must be greater than 0");
        }

        if self.auth.jwt_secret.is_empty() {
            bail!("jwt_secret must be set (auth.jwt_secret or JWT_SECRET)");
        }

        if self.auth.token_ttl_secs <= 0 {
            bail!("token_ttl_secs must be greater than 0");
        }

        if self.uploads.max_file_size == 0 {
            bail!("max_file_size must be greater than 0");
        }

        if self.uploads.sweep_interval_secs == 0 {
            bail!("sweep_interval_secs must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
