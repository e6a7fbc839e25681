use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// CookieSameSite
// ---------------------------------------------------------------------------

/// SameSite policy for the admin `token` cookie.
///
/// `strict` suits a same-origin deployment; `none` is needed when the UI is
/// served from another origin (and then requires `COOKIE_SECURE=true`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieSameSite {
    Strict,
    None,
}

impl FromStr for CookieSameSite {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "none" => Ok(Self::None),
            other => Err(anyhow::anyhow!("unknown same-site policy: {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub same_site: CookieSameSite,
}

// ---------------------------------------------------------------------------
// Upstream services
// ---------------------------------------------------------------------------

/// Username + API secret for the RAPT password grant.
#[derive(Debug, Clone)]
pub struct RaptCredentials {
    pub username: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct RaptSettings {
    pub username: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: String,
    pub auth_url: String,
    /// Hardware address of the preferred device, if any.
    pub target_mac: Option<String>,
}

impl RaptSettings {
    /// Credential gate: both username and secret must be present and non-empty.
    pub fn credentials(&self) -> Option<RaptCredentials> {
        match (self.username.as_deref(), self.api_secret.as_deref()) {
            (Some(u), Some(s)) if !u.is_empty() && !s.is_empty() => Some(RaptCredentials {
                username: u.to_owned(),
                api_secret: s.to_owned(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriterSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs against the seeded in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub cookie: CookieSettings,
    pub rapt: RaptSettings,
    pub writer: WriterSettings,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            jwt_secret: required("JWT_SECRET")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            cookie: CookieSettings {
                secure: parse_bool(&optional("COOKIE_SECURE", "false"))
                    .context("COOKIE_SECURE must be true or false")?,
                same_site: optional("COOKIE_SAME_SITE", "strict")
                    .parse()
                    .context("COOKIE_SAME_SITE must be 'strict' or 'none'")?,
            },
            rapt: RaptSettings {
                username: non_empty("RAPT_USERNAME"),
                api_secret: non_empty("RAPT_API_SECRET"),
                base_url: optional("RAPT_BASE_URL", "https://api.rapt.io"),
                auth_url: optional("RAPT_AUTH_URL", "https://id.rapt.io/connect/token"),
                target_mac: non_empty("RAPT_TARGET_MAC"),
            },
            writer: WriterSettings {
                api_key: non_empty("OPENAI_API_KEY"),
                base_url: optional("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: optional("OPENAI_MODEL", "gpt-4o"),
                timeout: Duration::from_secs(
                    optional("GENERATION_TIMEOUT_SECS", "8")
                        .parse()
                        .context("GENERATION_TIMEOUT_SECS must be a positive integer")?,
                ),
            },
            admin: match (non_empty("ADMIN_USERNAME"), non_empty("ADMIN_PASSWORD")) {
                (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
                _ => None,
            },
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(anyhow::anyhow!("not a boolean: {other:?}")),
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
