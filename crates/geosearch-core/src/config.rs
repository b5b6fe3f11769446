//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys are reached from the environment with `__`, e.g.
//! `APP_DEMO__INDEX_PATH=/tmp/places`. Provides helpers to expand `~` and
//! `${VAR}` in paths.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        tracing::debug!(env = %env_name, "loading configuration");

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The `[demo]` table, with defaults for anything not configured.
    pub fn demo(&self) -> anyhow::Result<DemoSettings> {
        if self.figment.find_value("demo").is_err() {
            return Ok(DemoSettings::default());
        }
        self.get("demo")
    }

    fn validate(&self) -> anyhow::Result<()> {
        let demo = self.demo()?;
        if demo.index_path.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig("demo.index_path is empty".to_string()).into());
        }
        Ok(())
    }
}

/// Defaults for the demo driver. Command-line flags override these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub index_path: String,
    pub distance: String,
    pub search: String,
    pub center_lon: f64,
    pub center_lat: f64,
    pub fresh: bool,
    pub debug: bool,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            index_path: "index.bleve".to_string(),
            distance: "1km".to_string(),
            search: "cafe".to_string(),
            center_lon: -71.26050,
            center_lat: 46.79049,
            fresh: false,
            debug: false,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_any_source() {
        Jail::expect_with(|_jail| {
            let config = Config::load().expect("load");
            assert_eq!(config.demo().expect("demo"), DemoSettings::default());
            Ok(())
        });
    }

    #[test]
    fn toml_layers_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [demo]
                index_path = "base.idx"
                search = "school"
                "#,
            )?;
            jail.create_file(
                "config.test.toml",
                r#"
                [demo]
                distance = "2km"
                "#,
            )?;
            jail.set_env("RUST_ENV", "test");
            jail.set_env("APP_DEMO__INDEX_PATH", "from-env.idx");

            let demo = Config::load().expect("load").demo().expect("demo");
            assert_eq!(demo.index_path, "from-env.idx");
            assert_eq!(demo.search, "school");
            assert_eq!(demo.distance, "2km");
            assert_eq!(demo.center_lat, DemoSettings::default().center_lat);
            Ok(())
        });
    }

    #[test]
    fn empty_index_path_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[demo]\nindex_path = \"  \"\n")?;
            assert!(Config::load().is_err());
            Ok(())
        });
    }

    #[test]
    fn expands_env_vars_in_paths() {
        Jail::expect_with(|jail| {
            jail.set_env("GEOSEARCH_DATA", "/data");
            assert_eq!(expand_path("$GEOSEARCH_DATA/places.idx"), PathBuf::from("/data/places.idx"));
            assert_eq!(expand_path("relative.idx"), PathBuf::from("relative.idx"));
            Ok(())
        });
    }
}
