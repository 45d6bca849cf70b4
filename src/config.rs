use crate::client::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use std::{env, path::PathBuf};

/// Default server port when PORT is not set.
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DATABASE_URL: &str = "sqlite://rickmorty.db?mode=rwc";

/// Environment variable names for the listener, upstream and store.
pub mod env_keys {
    pub const PORT: &str = "PORT";
    pub const HOST: &str = "HOST";
    pub const RICKMORTY_API_BASE_URL: &str = "RICKMORTY_API_BASE_URL";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DEBUG: &str = "DEBUG";
    pub const VERBOSE: &str = "VERBOSE";
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub database_url: String,
    pub debug: bool,
    pub verbose: bool,
}

impl Config {
    /// Fallback .env locations after the working directory: home, then /etc.
    fn dotenv_fallbacks() -> Vec<PathBuf> {
        let home = env::var_os("HOME").or_else(|| env::var_os("USERPROFILE"));
        home.map(|h| PathBuf::from(h).join(".rickmorty-gateway.env"))
            .into_iter()
            .chain([PathBuf::from("/etc/rickmorty-gateway/.env")])
            .collect()
    }

    /// Loads the first .env that exists: `custom_path`, cwd, then the fallbacks.
    fn load_dotenv(custom_path: Option<PathBuf>) -> Option<PathBuf> {
        let load = |path: &PathBuf| path.is_file() && dotenvy::from_path(path).is_ok();

        if let Some(path) = custom_path {
            if load(&path) {
                return Some(path);
            }
            eprintln!("WARNING: Custom config file not found: {}", path.display());
        }

        dotenvy::dotenv()
            .ok()
            .or_else(|| Self::dotenv_fallbacks().into_iter().find(|p| load(p)))
    }

    /// Parse a boolean value (true, 1, yes => true).
    fn parse_bool(value: &str) -> bool {
        let v = value.trim().to_lowercase();
        v == "1" || v == "true" || v == "yes"
    }

    pub fn from_env_with_path(custom_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = Self::load_dotenv(custom_path) {
            eprintln!("Loaded config from: {}", path.display());
        } else {
            eprintln!("No .env file found, using environment variables only");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        use env_keys::*;

        let port = lookup(PORT)
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let host = lookup(HOST)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let api_base_url = lookup(RICKMORTY_API_BASE_URL)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&api_base_url)
            .context("RICKMORTY_API_BASE_URL must be a valid URL")?;

        let database_url = lookup(DATABASE_URL)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let debug = lookup(DEBUG).is_some_and(|v| Self::parse_bool(&v));
        let verbose = lookup(VERBOSE).is_some_and(|v| Self::parse_bool(&v));

        Ok(Config {
            host,
            port,
            api_base_url,
            database_url,
            debug,
            verbose,
        })
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
