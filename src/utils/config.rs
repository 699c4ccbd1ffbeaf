use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context, anyhow};
use tracing::info;

use crate::database::StoreOptions;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_PATH: &str = "dentists.sqlite";
pub const DEFAULT_PUBLIC_DIR: &str = "public";

const ENV_KEYS: [&str; 5] = [
    "DENTAL_HOST",
    "DENTAL_PORT",
    "DENTAL_DB_PATH",
    "DENTAL_PUBLIC_DIR",
    "DENTAL_RESEED",
];

/// Values given on the command line. Anything left empty is looked up as a
/// `DENTAL_*` process environment variable, then as a key in the env file,
/// then falls back to the built-in defaults.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub public_dir: Option<PathBuf>,
    pub no_reseed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub public_dir: PathBuf,
    pub reseed: bool,
}

impl AppConfig {
    pub fn resolve(overrides: Overrides, env_path: &Path) -> Result<Self> {
        Self::resolve_with(overrides, env_path, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::resolve`] with the process environment replaced
    /// by `process_env`.
    pub fn resolve_with(
        overrides: Overrides,
        env_path: &Path,
        process_env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut env = if env_path.exists() {
            let values = load_from_env(env_path)?;
            info!("Loaded settings from {:?}", env_path);
            values
        } else {
            HashMap::new()
        };
        for key in ENV_KEYS {
            if let Some(value) = process_env(key) {
                env.insert(key.to_string(), value);
            }
        }

        let host = overrides
            .host
            .or_else(|| env.get("DENTAL_HOST").cloned())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match (overrides.port, env.get("DENTAL_PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("Invalid DENTAL_PORT value '{}'", raw))?,
            (None, None) => DEFAULT_PORT,
        };

        let db_path = overrides
            .db_path
            .or_else(|| env.get("DENTAL_DB_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let public_dir = overrides
            .public_dir
            .or_else(|| env.get("DENTAL_PUBLIC_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR));

        let reseed = if overrides.no_reseed {
            false
        } else {
            match env.get("DENTAL_RESEED") {
                Some(raw) => parse_flag(raw)
                    .ok_or_else(|| anyhow!("Invalid DENTAL_RESEED value '{}'", raw))?,
                None => true,
            }
        };

        Ok(Self { host, port, db_path, public_dir, reseed })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            path: self.db_path.clone(),
            reseed: self.reseed,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn load_from_env(path: &Path) -> Result<HashMap<String, String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut values = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    Ok(values)
}
