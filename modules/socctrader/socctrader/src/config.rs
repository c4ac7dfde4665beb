//! Configuration for the socctrader module (`modules.socctrader.config`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use socckit::PageLimits;

use crate::domain::sync::backoff::Backoff;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SocctraderConfig {
    /// Application name used in alert header names and messages.
    pub app_name: String,
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub search: SearchConfig,
    pub sync: SyncConfig,
}

impl Default for SocctraderConfig {
    fn default() -> Self {
        Self {
            app_name: "socctraderApp".to_owned(),
            default_page_size: 20,
            max_page_size: 2000,
            search: SearchConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl SocctraderConfig {
    #[must_use]
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_size: self.default_page_size,
            max_size: self.max_page_size,
        }
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    /// Returns a human readable message naming the offending key.
    pub fn validate(&self) -> Result<(), String> {
        if self.app_name.trim().is_empty() {
            return Err("app_name must not be empty".to_owned());
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(format!(
                "default_page_size ({}) must be in 1..=max_page_size ({})",
                self.default_page_size, self.max_page_size
            ));
        }
        if self.sync.factor < 1.0 {
            return Err(format!("sync.factor ({}) must be >= 1.0", self.sync.factor));
        }
        if self.sync.base_delay_ms == 0 || self.sync.base_delay_ms > self.sync.max_delay_ms {
            return Err(format!(
                "sync.base_delay_ms ({}) must be in 1..=sync.max_delay_ms ({})",
                self.sync.base_delay_ms, self.sync.max_delay_ms
            ));
        }
        if self.search.backend == SearchBackend::Elasticsearch {
            url::Url::parse(&self.search.url)
                .map_err(|e| format!("search.url '{}' is invalid: {e}", self.search.url))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// In-process index; lost on restart and rebuilt by reconciliation.
    #[default]
    Memory,
    Elasticsearch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SearchConfig {
    pub backend: SearchBackend,
    pub url: String,
    /// Prepended to every index name, e.g. `socctrader-` gives `socctrader-team`.
    pub index_prefix: String,
    pub request_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackend::Memory,
            url: "http://localhost:9200".to_owned(),
            index_prefix: String::new(),
            request_timeout_ms: 5_000,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Retry policy for index writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SyncConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub factor: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 200,
            max_delay_ms: 30_000,
            factor: 2.0,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.factor,
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SocctraderConfig::default();
        assert_eq!(cfg.app_name, "socctraderApp");
        assert_eq!(cfg.page_limits(), PageLimits::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_section_fills_defaults() {
        let cfg: SocctraderConfig = serde_json::from_value(serde_json::json!({
            "search": { "backend": "elasticsearch", "url": "http://es:9200" },
            "sync": { "base_delay_ms": 10 }
        }))
        .unwrap();
        assert_eq!(cfg.search.backend, SearchBackend::Elasticsearch);
        assert_eq!(cfg.search.request_timeout_ms, 5_000);
        assert_eq!(cfg.sync.base_delay_ms, 10);
        assert_eq!(cfg.sync.max_delay_ms, 30_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<SocctraderConfig, _> =
            serde_json::from_value(serde_json::json!({ "page_size": 5 }));
        assert!(res.is_err());
    }

    #[test]
    fn validate_catches_inconsistent_values() {
        let mut cfg = SocctraderConfig {
            default_page_size: 50,
            max_page_size: 10,
            ..SocctraderConfig::default()
        };
        assert!(cfg.validate().unwrap_err().contains("default_page_size"));

        cfg = SocctraderConfig::default();
        cfg.search.backend = SearchBackend::Elasticsearch;
        "not a url".clone_into(&mut cfg.search.url);
        assert!(cfg.validate().unwrap_err().contains("search.url"));
    }
}
