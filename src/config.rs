use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub program: String,
    pub use_plugins: bool,
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "markitdown".to_string(),
            use_plugins: false,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub auth_token: Option<String>,
    pub engine: EngineConfig,
    pub max_upload_bytes: usize,
    pub upload_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid bind address {host}:{port}"))?;

        let timeout = match var("CONVERSION_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("CONVERSION_TIMEOUT_SECS is not a number: {raw}"))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let max_upload_bytes = match var("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("MAX_UPLOAD_BYTES is not a number: {raw}"))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            addr,
            auth_token: var("API_AUTH_TOKEN"),
            engine: EngineConfig {
                program: var("MARKITDOWN_BIN").unwrap_or_else(|| EngineConfig::default().program),
                use_plugins: var("MARKITDOWN_ENABLE_PLUGINS")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(false),
                timeout,
            },
            max_upload_bytes,
            upload_dir: var("UPLOAD_TMP_DIR").map(PathBuf::from),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
