use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::facade::crm::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::storage::DurabilityMode;

/// Server and store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmConfig {
    pub host: String,
    pub port: u16,
    /// Snapshot file; `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,
    pub durability: DurabilityMode,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Allowed browser origin; `None` allows any.
    pub cors_origin: Option<String>,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CrmConfig {
    pub fn new() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_path: None,
            durability: DurabilityMode::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            cors_origin: None,
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = mode;
        self
    }

    pub fn page_sizes(mut self, default_size: usize, max_size: usize) -> Self {
        self.default_page_size = default_size;
        self.max_page_size = max_size;
        self
    }

    pub fn cors_origin(mut self, origin: &str) -> Self {
        self.cors_origin = Some(origin.to_string());
        self
    }

    /// Reads `CRM_*` variables, loading a `.env` file first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();

        if let Some(host) = lookup("CRM_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("CRM_PORT") {
            config.port = port
                .parse::<u16>()
                .context("CRM_PORT must be a valid u16")?;
        }
        if let Some(path) = lookup("CRM_DATA_PATH").filter(|p| !p.trim().is_empty()) {
            config.data_path = Some(PathBuf::from(path));
        }
        if let Some(mode) = lookup("CRM_DURABILITY") {
            config.durability = mode
                .parse::<DurabilityMode>()
                .map_err(anyhow::Error::msg)
                .context("CRM_DURABILITY must be one of: sync, async, none")?;
        }
        if let Some(size) = lookup("CRM_DEFAULT_PAGE_SIZE") {
            config.default_page_size = size
                .parse::<usize>()
                .context("CRM_DEFAULT_PAGE_SIZE must be a positive integer")?;
        }
        if let Some(size) = lookup("CRM_MAX_PAGE_SIZE") {
            config.max_page_size = size
                .parse::<usize>()
                .context("CRM_MAX_PAGE_SIZE must be a positive integer")?;
        }
        if let Some(origin) = lookup("CRM_CORS_ORIGIN").filter(|o| !o.trim().is_empty()) {
            config.cors_origin = Some(origin);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            anyhow::bail!("max page size must be at least 1");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "default page size {} must be between 1 and {}",
                self.default_page_size,
                self.max_page_size
            );
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = CrmConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CrmConfig::new());
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert!(config.data_path.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = CrmConfig::from_lookup(lookup(&[
            ("CRM_HOST", "127.0.0.1"),
            ("CRM_PORT", "9000"),
            ("CRM_DATA_PATH", "/tmp/crm.snapshot"),
            ("CRM_DURABILITY", "async"),
            ("CRM_DEFAULT_PAGE_SIZE", "25"),
            ("CRM_MAX_PAGE_SIZE", "50"),
            ("CRM_CORS_ORIGIN", "http://localhost:3000"),
        ]))
        .unwrap();

        assert_eq!(config.address(), "127.0.0.1:9000");
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/crm.snapshot")));
        assert_eq!(config.durability, DurabilityMode::Async);
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(CrmConfig::from_lookup(lookup(&[("CRM_PORT", "eighty")])).is_err());
        assert!(CrmConfig::from_lookup(lookup(&[("CRM_DURABILITY", "maybe")])).is_err());
        assert!(
            CrmConfig::from_lookup(lookup(&[
                ("CRM_DEFAULT_PAGE_SIZE", "200"),
                ("CRM_MAX_PAGE_SIZE", "100"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn builder_setters() {
        let config = CrmConfig::new()
            .host("localhost")
            .port(3000)
            .data_path("data/crm.snapshot")
            .durability(DurabilityMode::None)
            .page_sizes(5, 20)
            .cors_origin("http://example.test");
        assert_eq!(config.address(), "localhost:3000");
        assert_eq!(config.durability, DurabilityMode::None);
        assert!(config.validate().is_ok());
    }
}
