//! Platform Configuration
//!
//! Built once at process start and handed to the services that need it.
//! Nothing below the binary reads the environment directly.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RV_API_PORT` | `4000` | HTTP API port |
//! | `RV_STORAGE` | `mongo` | `mongo` or `memory` |
//! | `RV_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `RV_MONGO_DB` | `revalidation` | MongoDB database name |
//! | `RV_JWT_SECRET` | - | URL-safe base64 HMAC key (required outside dev mode) |
//! | `RV_TOKEN_EXPIRY_MINUTES` | `4320` | Access token lifetime |
//! | `RV_UPLOADS_DIR` | `uploads` | Evidence file directory |
//! | `RV_MAIL_RELAY_URL` | - | Mail relay endpoint; mail is only logged when unset |
//! | `RV_MAIL_RELAY_TOKEN` | - | Bearer token for the mail relay |
//! | `RV_MAIL_SENDER` | `no-reply@revalidation.local` | From address |
//! | `RV_MAIL_TIMEOUT_SECS` | `10` | Per-attempt mail timeout |
//! | `RV_MAIL_MAX_ATTEMPTS` | `3` | Mail attempts per notification |
//! | `RV_MAIL_DISPATCH_DEADLINE_SECS` | `15` | Upper bound on all mail for one event |
//! | `RV_ASSIGNMENT_POLICY` | `random` | `random` or `round_robin` |
//! | `RV_DEV_MODE` | `false` | Seed demo data, allow a generated JWT key |
//! | `RV_LOG_FORMAT` | `text` | `text` or `json` |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use base64::{engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD}, Engine};
use rand::RngCore;
use tracing::warn;

use crate::error::{PlatformError, Result};

/// Minimum HMAC key length in bytes
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentPolicyKind {
    Random,
    RoundRobin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub relay_url: Option<String>,
    pub relay_token: Option<String>,
    pub sender: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    /// Bound on all deliveries for one lifecycle event, retries included
    pub dispatch_deadline: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            relay_token: None,
            sender: "no-reply@revalidation.local".to_string(),
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            dispatch_deadline: Duration::from_secs(15),
        }
    }
}

/// Symmetric signing key. Debug output never shows the bytes.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_SECRET_LEN {
            return Err(PlatformError::configuration(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self(bytes))
    }

    /// Decode a URL-safe base64 key, padded or not.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        let bytes = URL_SAFE
            .decode(encoded)
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
            .map_err(|_| PlatformError::configuration("JWT secret is not valid URL-safe base64"))?;
        Self::new(bytes)
    }

    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_SECRET_LEN * 2];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub api_port: u16,
    pub storage: StorageBackend,
    pub mongo_url: String,
    pub mongo_db: String,
    pub jwt_secret: SigningSecret,
    pub token_expiry: Duration,
    pub uploads_dir: PathBuf,
    pub mail: MailConfig,
    pub assignment_policy: AssignmentPolicyKind,
    pub dev_mode: bool,
    pub log_format: LogFormat,
}

impl PlatformConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let dev_mode = get("RV_DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let jwt_secret = match get("RV_JWT_SECRET") {
            Some(encoded) => SigningSecret::from_base64(&encoded)?,
            None if dev_mode => {
                warn!("RV_JWT_SECRET not set; generated an ephemeral key for dev mode");
                SigningSecret::generate()
            }
            None => return Err(PlatformError::configuration("RV_JWT_SECRET is required")),
        };

        let storage = match get_or("RV_STORAGE", "mongo").to_lowercase().as_str() {
            "mongo" | "mongodb" => StorageBackend::Mongo,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(PlatformError::configuration(format!("Unknown RV_STORAGE: {}", other)))
            }
        };

        let assignment_policy = match get_or("RV_ASSIGNMENT_POLICY", "random").to_lowercase().as_str() {
            "random" => AssignmentPolicyKind::Random,
            "round_robin" | "round-robin" => AssignmentPolicyKind::RoundRobin,
            other => {
                return Err(PlatformError::configuration(format!(
                    "Unknown RV_ASSIGNMENT_POLICY: {}",
                    other
                )))
            }
        };

        let log_format = if get_or("RV_LOG_FORMAT", "text").eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        };

        let token_expiry_minutes: u64 = parse(&get, "RV_TOKEN_EXPIRY_MINUTES", 4320)?;
        if token_expiry_minutes == 0 {
            return Err(PlatformError::configuration("RV_TOKEN_EXPIRY_MINUTES must be positive"));
        }

        let defaults = MailConfig::default();
        let mail = MailConfig {
            relay_url: get("RV_MAIL_RELAY_URL"),
            relay_token: get("RV_MAIL_RELAY_TOKEN"),
            sender: get_or("RV_MAIL_SENDER", &defaults.sender),
            timeout: Duration::from_secs(parse(&get, "RV_MAIL_TIMEOUT_SECS", 10)?),
            max_attempts: parse::<u32, _>(&get, "RV_MAIL_MAX_ATTEMPTS", 3)?.max(1),
            retry_backoff: defaults.retry_backoff,
            dispatch_deadline: Duration::from_secs(parse(&get, "RV_MAIL_DISPATCH_DEADLINE_SECS", 15)?),
        };
        if mail.dispatch_deadline.is_zero() {
            return Err(PlatformError::configuration("RV_MAIL_DISPATCH_DEADLINE_SECS must be positive"));
        }

        Ok(Self {
            api_port: parse(&get, "RV_API_PORT", 4000)?,
            storage,
            mongo_url: get_or("RV_MONGO_URL", "mongodb://localhost:27017"),
            mongo_db: get_or("RV_MONGO_DB", "revalidation"),
            jwt_secret,
            token_expiry: Duration::from_secs(token_expiry_minutes * 60),
            uploads_dir: PathBuf::from(get_or("RV_UPLOADS_DIR", "uploads")),
            mail,
            assignment_policy,
            dev_mode,
            log_format,
        })
    }
}

fn parse<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PlatformError::configuration(format!("Invalid value for {}: {}", key, raw))),
        None => Ok(default),
    }
}
