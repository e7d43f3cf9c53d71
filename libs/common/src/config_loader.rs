//! Layered configuration loading
//!
//! Sources are merged in the order the builder methods are called, later
//! sources overriding earlier ones. The usual chain is
//! defaults -> YAML file -> legacy env names -> prefixed env.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Builder over a `Figment`
pub struct ConfigLoader {
    figment: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
        }
    }

    /// Start from the serialized form of `defaults`
    pub fn with_defaults<T: Serialize>(mut self, defaults: T) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(defaults));
        self
    }

    /// Merge a YAML file; a missing file contributes nothing
    pub fn with_yaml_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        debug!("Merging configuration file {}", path.display());
        self.figment = self.figment.merge(Yaml::file(path));
        self
    }

    /// Merge a YAML file that must exist
    pub fn with_required_yaml_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        Ok(self.with_yaml_file(path))
    }

    /// Merge `PREFIX_SECTION__KEY` style variables (`__` separates nesting)
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        let prefix = format!("{}_", prefix.trim_end_matches('_'));
        self.figment = self.figment.merge(Env::prefixed(&prefix).split("__"));
        self
    }

    /// Merge unprefixed variables under fixed names, each mapped to a dotted
    /// configuration path, e.g. `("CRON_SECRET", "trigger.cron_secret")`.
    ///
    /// Values are taken verbatim as strings: `CRON_SECRET=00123` stays
    /// `"00123"` instead of being parsed into the number 123.
    pub fn with_env_aliases(mut self, aliases: &[(&str, &str)]) -> Self {
        for (name, path) in aliases {
            if let Ok(value) = std::env::var(name) {
                debug!("Using {} for {}", name, path);
                self.figment = self.figment.merge(Serialized::default(path, value));
            }
        }
        self
    }

    /// Re-read selected `PREFIX_SECTION__KEY` variables verbatim as strings.
    ///
    /// `with_env_prefix` lets figment parse values, which turns `00123` into
    /// 123; call this afterwards for string keys such as secrets and IDs.
    pub fn with_raw_env_keys(mut self, prefix: &str, paths: &[&str]) -> Self {
        let prefix = prefix.trim_end_matches('_');
        for path in paths {
            let name = format!("{}_{}", prefix, path.replace('.', "__")).to_uppercase();
            if let Ok(value) = std::env::var(&name) {
                self.figment = self.figment.merge(Serialized::default(path, value));
            }
        }
        self
    }

    /// Extract the merged configuration
    pub fn build<T: DeserializeOwned>(self) -> Result<T> {
        self.figment
            .extract()
            .map_err(|e| Error::config(format!("Failed to load config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Inner {
        token: Option<String>,
        port: u16,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        name: String,
        inner: Inner,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                name: "default".to_string(),
                inner: Inner {
                    token: None,
                    port: 8080,
                },
            }
        }
    }

    static ALIASES: &[(&str, &str)] = &[("LEGACY_TOKEN", "inner.token")];
    static RAW_KEYS: &[&str] = &["inner.token"];

    #[test]
    fn test_defaults_only() {
        let config: TestConfig = ConfigLoader::new()
            .with_defaults(TestConfig::default())
            .build()
            .unwrap();
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn test_layering_order() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "name: from-file\ninner:\n  port: 9000\n")?;
            jail.set_env("LEGACY_TOKEN", "legacy");
            jail.set_env("TESTSRV_INNER__PORT", "9100");

            let config: TestConfig = ConfigLoader::new()
                .with_defaults(TestConfig::default())
                .with_yaml_file("test.yaml")
                .with_env_aliases(ALIASES)
                .with_env_prefix("TESTSRV")
                .build()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.name, "from-file");
            assert_eq!(config.inner.port, 9100);
            assert_eq!(config.inner.token.as_deref(), Some("legacy"));
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_beats_alias() {
        Jail::expect_with(|jail| {
            jail.set_env("LEGACY_TOKEN", "legacy");
            jail.set_env("TESTSRV_INNER__TOKEN", "prefixed");

            let config: TestConfig = ConfigLoader::new()
                .with_defaults(TestConfig::default())
                .with_env_aliases(ALIASES)
                .with_env_prefix("TESTSRV_")
                .build()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.inner.token.as_deref(), Some("prefixed"));
            Ok(())
        });
    }

    #[test]
    fn test_numeric_looking_strings_stay_verbatim() {
        Jail::expect_with(|jail| {
            jail.set_env("LEGACY_TOKEN", "00123");

            let config: TestConfig = ConfigLoader::new()
                .with_defaults(TestConfig::default())
                .with_env_aliases(ALIASES)
                .with_env_prefix("TESTSRV")
                .with_raw_env_keys("TESTSRV", RAW_KEYS)
                .build()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.inner.token.as_deref(), Some("00123"));

            jail.set_env("TESTSRV_INNER__TOKEN", "0042");
            let config: TestConfig = ConfigLoader::new()
                .with_defaults(TestConfig::default())
                .with_env_aliases(ALIASES)
                .with_env_prefix("TESTSRV")
                .with_raw_env_keys("TESTSRV", RAW_KEYS)
                .build()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.inner.token.as_deref(), Some("0042"));
            Ok(())
        });
    }

    #[test]
    fn test_required_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::new().with_required_yaml_file(dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
