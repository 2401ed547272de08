use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Upper bound for `JWT_EXPIRY_HOURS`: one year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Failed to hash admin password: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base used when building absolute media URLs. Falls back to
    /// `http://localhost:<port>` when unset.
    pub public_url: Option<String>,
    pub enable_cors: bool,
    /// `None` disables the request body limit entirely.
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub admin_username: String,
    #[serde(skip_serializing)]
    pub admin_password_hash: String,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    ///
    /// Defaults are chosen by `APP_ENV`, then individual variables override them.
    /// The signing secret and the admin credential have no defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_default();

        let admin_password_hash = admin_password_hash(
            env::var("ADMIN_PASSWORD_HASH").ok(),
            env::var("ADMIN_PASSWORD").ok(),
            bcrypt::DEFAULT_COST,
        )?;

        let config = match environment {
            Environment::Production => Self::production(jwt_secret, admin_password_hash),
            Environment::Development => Self::development(jwt_secret, admin_password_hash),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("PUBLIC_URL") {
            self.server.public_url = Some(v);
        }
        if let Ok(v) = env::var("ENABLE_CORS") {
            self.server.enable_cors = parse_var("ENABLE_CORS", &v)?;
        }
        if let Ok(v) = env::var("MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = Some(parse_var("MAX_UPLOAD_BYTES", &v)?);
        }

        // Storage overrides
        if let Ok(v) = env::var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("UPLOADS_DIR") {
            self.storage.uploads_dir = PathBuf::from(v);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = parse_var("JWT_EXPIRY_HOURS", &v)?;
        }
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            self.security.admin_username = v;
        }

        Ok(self)
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.security.admin_username.is_empty() {
            return Err(ConfigError::Missing("ADMIN_USERNAME"));
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRY_HOURS",
                value: self.security.jwt_expiry_hours.to_string(),
            });
        }
        if let Some(url) = &self.server.public_url {
            url::Url::parse(url).map_err(|_| ConfigError::Invalid {
                name: "PUBLIC_URL",
                value: url.clone(),
            })?;
        }
        Ok(())
    }

    /// Base URL for links handed back to clients.
    pub fn public_url(&self) -> String {
        match &self.server.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.server.port),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn development(jwt_secret: String, admin_password_hash: String) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                public_url: None,
                enable_cors: true,
                max_upload_bytes: None,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                uploads_dir: PathBuf::from("uploads"),
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry_hours: 8,
                admin_username: "admin".to_string(),
                admin_password_hash,
            },
        }
    }

    fn production(jwt_secret: String, admin_password_hash: String) -> Self {
        let mut config = Self::development(jwt_secret, admin_password_hash);
        config.environment = Environment::Production;
        config
    }
}

/// A ready-made hash wins; otherwise a plaintext password is hashed at `cost`.
fn admin_password_hash(
    hash: Option<String>,
    password: Option<String>,
    cost: u32,
) -> Result<String, ConfigError> {
    if let Some(hash) = hash.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        return Ok(hash.to_string());
    }
    match password.filter(|p| !p.is_empty()) {
        Some(password) => Ok(bcrypt::hash(password, cost)?),
        None => Err(ConfigError::Missing("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD")),
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn test_config(root: &std::path::Path) -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            public_url: None,
            enable_cors: true,
            max_upload_bytes: None,
        },
        storage: StorageConfig {
            data_dir: root.join("data"),
            uploads_dir: root.join("uploads"),
        },
        security: SecurityConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 8,
            admin_username: "admin".to_string(),
            // Low cost keeps the tests fast.
            admin_password_hash: bcrypt::hash("1234", 4).expect("hash"),
        },
    }
}
