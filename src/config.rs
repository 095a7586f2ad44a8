//! Configuration loaded from an optional TOML file with environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Minimum key length accepted by the identity cookie policy.
const SESSION_KEY_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {0}")]
    Env(&'static str),

    #[error("session key must be at least 32 bytes")]
    SessionKey,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(default)]
    pub sign_up: SignUpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where the document store lives. No path means a temporary database that
/// is removed when the process exits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_session_key")]
    pub key: String,
}

fn default_cookie_name() -> String {
    "auth-cookie".to_string()
}

fn default_session_key() -> String {
    "0".repeat(SESSION_KEY_LEN)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure: false,
            key: default_session_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_templates_dir")]
    pub dir: PathBuf,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_templates_dir(),
        }
    }
}

impl TemplatesConfig {
    pub fn glob(&self) -> String {
        format!("{}/**/*", self.dir.display())
    }
}

/// Demo accounts written at startup, all sharing `password`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,

    #[serde(default = "default_seed_password")]
    pub password: String,
}

fn default_seed_enabled() -> bool {
    true
}

fn default_seed_password() -> String {
    "password".to_string()
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_seed_enabled(),
            password: default_seed_password(),
        }
    }
}

/// Usernames every new account starts out following, so the first timeline
/// is not empty.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpConfig {
    #[serde(default = "default_following")]
    pub default_following: Vec<String>,
}

fn default_following() -> Vec<String> {
    vec!["karl".to_string()]
}

impl Default for SignUpConfig {
    fn default() -> Self {
        Self {
            default_following: default_following(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "instaclone=debug,actix_web=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Loads `INSTACLONE_CONFIG`, or `instaclone.toml` in the working
    /// directory when present, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("INSTACLONE_CONFIG")
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from("instaclone.toml");
                local.exists().then_some(local)
            });
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("INSTACLONE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("INSTACLONE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Env("INSTACLONE_PORT"))?;
        }
        if let Some(path) = var("INSTACLONE_DB_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Some(filter) = var("RUST_LOG") {
            self.logging.filter = filter;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.key.len() < SESSION_KEY_LEN {
            return Err(ConfigError::SessionKey);
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.cookie_name, "auth-cookie");
        assert!(config.storage.path.is_none());
        assert_eq!(config.sign_up.default_following, vec!["karl"]);
        assert!(config.seed.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn file_values_override_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000

            [storage]
            path = "/var/lib/instaclone"

            [auth]
            bcrypt_cost = 4

            [sign_up]
            default_following = []
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.path, Some(PathBuf::from("/var/lib/instaclone")));
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert!(config.sign_up.default_following.is_empty());
    }

    #[test]
    fn environment_wins_over_file() {
        let env: HashMap<&str, &str> = [("INSTACLONE_PORT", "3000"), ("INSTACLONE_DB_PATH", "db")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.path, Some(PathBuf::from("db")));

        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "INSTACLONE_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env("INSTACLONE_PORT")));
    }

    #[test]
    fn short_session_key_is_rejected() {
        let config = Config::from_toml("[session]\nkey = \"short\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::SessionKey)));
    }
}
