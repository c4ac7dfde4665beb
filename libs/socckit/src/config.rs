//! Layered application configuration.
//!
//! Layers, lowest to highest precedence:
//! 1. built-in defaults
//! 2. a YAML file (when given)
//! 3. environment variables prefixed with `SOCCTRADER__` (`__` separates keys)
//! 4. CLI overrides ([`AppConfig::apply_cli_overrides`])
//!
//! Module sections live under `modules.<name>` and are read with
//! [`AppConfig::module_config_or_default`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "SOCCTRADER__";
pub const MOCK_DSN: &str = "sqlite::memory:";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file does not exist: {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid config for module '{module}': {source}")]
    InvalidConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to render configuration: {0}")]
    Render(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Per-request timeout applied by the HTTP stack.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub dsn: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite://socctrader.db?mode=rwc".to_owned(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level for every target (`trace`..`error`).
    pub level: String,
    pub format: LogFormat,
    /// Extra `EnvFilter` directives, e.g. `sea_orm=warn,tower_http=debug`.
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
            filter: None,
        }
    }
}

/// Whole-process configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Raw per-module sections: `modules.<name>.config`.
    pub modules: BTreeMap<String, serde_json::Value>,
}

/// Command line values that override the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}

impl AppConfig {
    /// Load defaults, then the optional YAML file, then `SOCCTRADER__*` env vars.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingFile`] when `path` does not exist and
    /// [`ConfigError::Load`] when a layer cannot be parsed.
    pub fn load_layered(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment.extract().map_err(Box::new)?;
        tracing::debug!(
            file = path.map(|p| p.display().to_string()),
            modules = config.modules.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Same as [`AppConfig::load_layered`]; without a file only defaults and env apply.
    ///
    /// # Errors
    /// See [`AppConfig::load_layered`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(path)
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.bind_addr = with_port(&self.server.bind_addr, port);
        }

        match args.verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }

        if args.mock {
            MOCK_DSN.clone_into(&mut self.database.dsn);
            self.database.max_connections = 1;
        }
    }

    /// Render the effective configuration as YAML.
    ///
    /// # Errors
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_saphyr::to_string(self).map_err(|e| ConfigError::Render(e.to_string()))
    }

    /// Raw section of a module, if configured.
    #[must_use]
    pub fn module_section(&self, module: &str) -> Option<&serde_json::Value> {
        self.modules.get(module)
    }

    /// Typed `modules.<name>.config`, falling back to `T::default()` when the
    /// module, or its `config` key, is absent.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidConfig`] when the section exists but does
    /// not deserialize into `T`.
    pub fn module_config_or_default<T: DeserializeOwned + Default>(
        &self,
        module: &str,
    ) -> Result<T, ConfigError> {
        let Some(section) = self
            .module_section(module)
            .and_then(serde_json::Value::as_object)
            .and_then(|obj| obj.get("config"))
        else {
            return Ok(T::default());
        };

        serde_json::from_value(section.clone()).map_err(|source| ConfigError::InvalidConfig {
            module: module.to_owned(),
            source,
        })
    }
}

fn with_port(bind_addr: &str, port: u16) -> String {
    match bind_addr.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind_addr}:{port}"),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct SampleModuleConfig {
        app_name: String,
        page_size: u32,
    }

    #[test]
    fn defaults_without_file() {
        figment::Jail::expect_with(|_jail| {
            let cfg = AppConfig::load_or_default(None).unwrap();
            assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080");
            assert_eq!(cfg.logging.format, LogFormat::Text);
            assert!(cfg.modules.is_empty());
            Ok(())
        });
    }

    #[test]
    fn yaml_then_env_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "app.yaml",
                r"
server:
  bind_addr: 0.0.0.0:9000
logging:
  level: debug
modules:
  socctrader:
    config:
      app_name: fromYaml
      page_size: 5
",
            )?;
            jail.set_env("SOCCTRADER__LOGGING__LEVEL", "warn");

            let cfg = AppConfig::load_layered(Some(Path::new("app.yaml"))).unwrap();
            assert_eq!(cfg.server.bind_addr, "0.0.0.0:9000");
            assert_eq!(cfg.logging.level, "warn");

            let module: SampleModuleConfig = cfg.module_config_or_default("socctrader").unwrap();
            assert_eq!(module.app_name, "fromYaml");
            assert_eq!(module.page_size, 5);
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load_layered(Some(Path::new("/definitely/not/here.yaml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn cli_overrides_port_verbosity_and_mock() {
        let mut cfg = AppConfig::default();
        cfg.apply_cli_overrides(&CliArgs {
            port: Some(9999),
            verbose: 2,
            mock: true,
            ..CliArgs::default()
        });
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:9999");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.database.dsn, MOCK_DSN);
    }

    #[test]
    fn module_config_lenient_and_invalid() {
        let mut cfg = AppConfig::default();
        let missing: SampleModuleConfig = cfg.module_config_or_default("nope").unwrap();
        assert_eq!(missing, SampleModuleConfig::default());

        cfg.modules
            .insert("bad".to_owned(), json!({"config": {"page_size": "many"}}));
        let err = cfg
            .module_config_or_default::<SampleModuleConfig>("bad")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { ref module, .. } if module == "bad"));
    }

    #[test]
    fn renders_yaml() {
        let yaml = AppConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("bind_addr"));
        assert!(yaml.contains("dsn"));
    }
}
