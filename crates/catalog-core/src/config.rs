//! Admin client configuration.
//!
//! Loaded from TOML, then overridden by `CATALOG_*` environment variables.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "CATALOG_";

/// Rows per page on each screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub products: usize,
    pub customers: usize,
    pub orders: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            products: 7,
            customers: 5,
            orders: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Root the per-kind routes are joined onto (default: "http://localhost:5000/api/")
    pub base_url: String,
    /// Per-request timeout in milliseconds (default: 10000)
    pub timeout_ms: u64,
    pub page_size: PageSizes,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/".to_string(),
            timeout_ms: 10_000,
            page_size: PageSizes::default(),
        }
    }
}

impl AdminConfig {
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CoreError::Config(format!(
                "failed to read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(toml_str: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| CoreError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> CoreResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("failed to serialize config: {e}")))
    }

    /// Applies `CATALOG_BASE_URL`, `CATALOG_TIMEOUT_MS` and
    /// `CATALOG_{PRODUCTS,CUSTOMERS,ORDERS}_PAGE_SIZE`.
    pub fn apply_env_overrides(&mut self) -> CoreResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// explicit variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<()> {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));

        if let Some(val) = var("BASE_URL") {
            self.base_url = val;
        }
        if let Some(val) = var("TIMEOUT_MS") {
            self.timeout_ms = parse_var("TIMEOUT_MS", &val)?;
        }
        if let Some(val) = var("PRODUCTS_PAGE_SIZE") {
            self.page_size.products = parse_var("PRODUCTS_PAGE_SIZE", &val)?;
        }
        if let Some(val) = var("CUSTOMERS_PAGE_SIZE") {
            self.page_size.customers = parse_var("CUSTOMERS_PAGE_SIZE", &val)?;
        }
        if let Some(val) = var("ORDERS_PAGE_SIZE") {
            self.page_size.orders = parse_var("ORDERS_PAGE_SIZE", &val)?;
        }
        self.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Page size for a built-in record kind.
    pub fn page_size_for(&self, kind: &str) -> CoreResult<NonZeroUsize> {
        let size = match kind {
            "products" => self.page_size.products,
            "customers" => self.page_size.customers,
            "orders" => self.page_size.orders,
            other => return Err(CoreError::Config(format!("no page size for kind `{other}`"))),
        };
        NonZeroUsize::new(size)
            .ok_or_else(|| CoreError::Config(format!("page size for `{kind}` must be at least 1")))
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(CoreError::Config("base_url must not be empty".into()));
        }
        for kind in ["products", "customers", "orders"] {
            self.page_size_for(kind)?;
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(suffix: &str, raw: &str) -> CoreResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("invalid {ENV_PREFIX}{suffix}: {raw}")))
}
