use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Admin authentication settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
    #[serde(default)]
    pub cookie_secure: bool,
    /// Credentials used to create the first admin when the table is empty.
    #[serde(default)]
    pub bootstrap_email: Option<String>,
    #[serde(default)]
    pub bootstrap_password: Option<String>,
    #[serde(default)]
    pub bootstrap_name: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl(),
            cookie_secure: false,
            bootstrap_email: None,
            bootstrap_password: None,
            bootstrap_name: None,
        }
    }
}

fn default_token_ttl() -> i64 { 12 }

pub const MIN_JWT_SECRET_LEN: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: String,
    /// Prefix for `/uploads/...` paths in API responses; empty keeps them relative.
    #[serde(default)]
    pub public_base_url: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_allowed_mime")]
    pub allowed_mime: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            public_base_url: String::new(),
            max_bytes: default_max_upload_bytes(),
            allowed_mime: default_allowed_mime(),
        }
    }
}

fn default_upload_dir() -> String { "uploads".into() }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }
fn default_allowed_mime() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/webp",
        "image/gif",
        "application/pdf",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CorsConfig {
    /// Empty means permissive (development).
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file first; if absent, build from defaults plus environment.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(_) => Self::from_env(),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `SERVER_HOST`, `SERVER_PORT`, `UPLOAD_DIR` and
    /// `PUBLIC_BASE_URL`. Secrets and the DB URL are filled during normalization.
    pub fn from_env() -> Self {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Ok(dir) = std::env::var("UPLOAD_DIR") {
            cfg.uploads.dir = dir;
        }
        if let Ok(base) = std::env::var("PUBLIC_BASE_URL") {
            cfg.uploads.public_base_url = base;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.uploads.normalize();
        self.uploads.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
        if self.bootstrap_email.is_none() {
            self.bootstrap_email = std::env::var("ADMIN_EMAIL").ok();
        }
        if self.bootstrap_password.is_none() {
            self.bootstrap_password = std::env::var("ADMIN_PASSWORD").ok();
        }
        if self.token_ttl_hours <= 0 {
            self.token_ttl_hours = default_token_ttl();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes; set it in config.toml or JWT_SECRET"
            ));
        }
        if self.bootstrap_email.is_some() != self.bootstrap_password.is_some() {
            return Err(anyhow!("auth.bootstrap_email and auth.bootstrap_password must be set together"));
        }
        Ok(())
    }
}

impl UploadConfig {
    fn normalize(&mut self) {
        if self.dir.trim().is_empty() {
            self.dir = default_upload_dir();
        }
        while self.public_base_url.ends_with('/') {
            self.public_base_url.pop();
        }
        for m in self.allowed_mime.iter_mut() {
            *m = m.trim().to_ascii_lowercase();
        }
        self.allowed_mime.retain(|m| !m.is_empty());
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(anyhow!("uploads.max_bytes must be > 0"));
        }
        if self.allowed_mime.is_empty() {
            return Err(anyhow!("uploads.allowed_mime must list at least one type"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = ""
        port = 9000
        worker_threads = 0

        [database]
        url = "postgres://u:p@localhost:5432/cms"

        [auth]
        jwt_secret = "0123456789abcdef0123"

        [uploads]
        public_base_url = "https://cdn.example.com/"
        allowed_mime = [" Image/PNG ", ""]
    "#;

    #[test]
    fn parses_and_normalizes_sample() {
        let mut cfg = load_from_str(SAMPLE).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert_eq!(cfg.uploads.dir, "uploads");
        assert_eq!(cfg.uploads.public_base_url, "https://cdn.example.com");
        assert_eq!(cfg.uploads.allowed_mime, vec!["image/png".to_string()]);
    }

    #[test]
    fn svg_is_not_uploadable_by_default() {
        let uploads = UploadConfig::default();
        assert!(uploads.allowed_mime.iter().any(|m| m == "image/png"));
        assert!(!uploads.allowed_mime.iter().any(|m| m == "image/svg+xml"));
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://x".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_pool_inversion() {
        let db = DatabaseConfig {
            url: "postgres://x".into(),
            min_connections: 5,
            max_connections: 2,
            ..Default::default()
        };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let auth = AuthConfig { jwt_secret: "short".into(), ..Default::default() };
        assert!(auth.validate().is_err());
    }

    #[test]
    fn bootstrap_credentials_must_come_in_pairs() {
        let auth = AuthConfig {
            jwt_secret: "0123456789abcdef".into(),
            bootstrap_email: Some("admin@example.com".into()),
            ..Default::default()
        };
        assert!(auth.validate().is_err());
    }

    #[test]
    fn zero_upload_limit_is_invalid() {
        let up = UploadConfig { max_bytes: 0, ..Default::default() };
        assert!(up.validate().is_err());
    }
}
