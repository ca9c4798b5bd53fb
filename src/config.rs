use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};

use crate::application::record_service::ValidationMode;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://taskflow.db";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_ASSISTANT_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-8b:generateContent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub validation: ValidationMode,
}

impl ServerConfig {
    /// Reads `DATABASE_URL`, `HOST`, `PORT` and `TASKFLOW_STRICT_VALIDATION`.
    pub fn from_env() -> Result<Self> { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let host: IpAddr = match lookup("HOST") {
            Some(raw) => raw.parse().with_context(|| format!("invalid HOST {raw:?}"))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("invalid PORT {raw:?}"))?,
            None => DEFAULT_PORT,
        };
        let validation = match lookup("TASKFLOW_STRICT_VALIDATION").as_deref().map(str::trim) {
            Some("1") | Some("true") | Some("yes") => ValidationMode::Strict,
            _ => ValidationMode::Lenient,
        };
        Ok(Self { database_url, addr: SocketAddr::new(host, port), validation })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://localhost:5000/api`.
    pub backend_url: String,
    /// Present only when an API key is configured.
    pub assistant: Option<AssistantConfig>,
}

impl ClientConfig {
    pub fn from_env() -> Self { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend_url = lookup("TASKFLOW_BACKEND_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let assistant = lookup("TASKFLOW_ASSISTANT_KEY").filter(|k| !k.is_empty()).map(|api_key| AssistantConfig {
            endpoint: lookup("TASKFLOW_ASSISTANT_URL").unwrap_or_else(|| DEFAULT_ASSISTANT_URL.to_string()),
            api_key,
        });
        Self { backend_url, assistant }
    }
}

/// Creates the database file and its parent directories for file-backed URLs.
pub fn prepare_sqlite_file(database_url: &str) -> Result<()> {
    if database_url.contains(":memory:") { return Ok(()); }
    if let Some(rest) = database_url.strip_prefix("sqlite://") {
        // Connection options such as `?mode=rwc` are not part of the file name.
        let path = rest.split_once('?').map_or(rest, |(path, _)| path);
        // On Windows, absolute paths may look like /C:/path
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        use std::{fs, fs::OpenOptions, path::Path};
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| format!("create parent dirs for {parent:?}"))?;
            }
        }
        if !p.exists() {
            OpenOptions::new().create(true).append(true).open(p).with_context(|| format!("create sqlite file {p:?}"))?;
        }
    }
    Ok(())
}
