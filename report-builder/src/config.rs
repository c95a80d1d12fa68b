// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for the report builder.
//!
//! Sources, from lowest to highest priority:
//!
//! 1. the defaults shipped in `default-config.toml`
//! 2. an optional user TOML file
//! 3. environment variables prefixed with `JUNIT_REPORT_`

use crate::errors::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, Map, builder::DefaultState};
use junit_report::{SerializeOptions, XmlEncoding};
use serde::Deserialize;

/// Configuration for an [`XmlReportBuilder`](crate::XmlReportBuilder).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BuilderConfig {
    /// Keys of properties added to every report.
    pub properties: Vec<String>,

    /// Where to write the report when the run finishes, if anywhere.
    pub output: Option<Utf8PathBuf>,

    /// How to serialize the report.
    pub serialize_options: SerializeOptions,
}

impl BuilderConfig {
    /// The default config, embedded at build time.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The prefix for environment variable overrides.
    pub const ENV_PREFIX: &'static str = "JUNIT_REPORT";

    /// Loads the configuration, layering `config_file` (if any) and the process environment on
    /// top of the defaults.
    pub fn load(config_file: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        Self::load_impl(config_file, None)
    }

    /// Like [`load`](Self::load), but reads environment overrides from `env` instead of the
    /// process environment.
    pub fn load_with_env(
        config_file: Option<&Utf8Path>,
        env: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        Self::load_impl(config_file, Some(env))
    }

    fn load_impl(
        config_file: Option<&Utf8Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::make_default_config();
        if let Some(config_file) = config_file {
            builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
        }
        builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("properties")
                .source(env),
        );

        let config = builder.build().map_err(|error| ConfigError::Build {
            config_file: config_file.map(ToOwned::to_owned),
            error,
        })?;
        let config_impl: BuilderConfigImpl =
            serde_path_to_error::deserialize(config).map_err(|error| {
                ConfigError::Deserialize {
                    config_file: config_file.map(ToOwned::to_owned),
                    error,
                }
            })?;

        config_impl.resolve()
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BuilderConfigImpl {
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    output: Option<Utf8PathBuf>,
    newlines: bool,
    encoding: String,
}

impl BuilderConfigImpl {
    fn resolve(self) -> Result<BuilderConfig, ConfigError> {
        let encoding: XmlEncoding = self.encoding.parse().map_err(ConfigError::Encoding)?;
        let mut serialize_options = SerializeOptions::new();
        serialize_options
            .set_insert_line_breaks(self.newlines)
            .set_encoding(encoding);

        Ok(BuilderConfig {
            properties: self.properties,
            output: self.output,
            serialize_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn write_config(dir: &Utf8TempDir, contents: &str) -> Utf8PathBuf {
        let path = dir.path().join("report-builder.toml");
        std::fs::write(&path, contents).expect("writing config file succeeds");
        path
    }

    #[test]
    fn defaults() {
        let config = BuilderConfig::load_with_env(None, Map::new()).unwrap();
        assert_eq!(config, BuilderConfig::default());
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = Utf8TempDir::new().unwrap();
        let path = write_config(
            &dir,
            indoc! {r#"
                properties = ["os.name", "user.dir", "os.name"]
                output = "target/junit.xml"
                newlines = true
                encoding = "latin1"
            "#},
        );

        let config = BuilderConfig::load_with_env(Some(path.as_path()), Map::new()).unwrap();
        assert_eq!(config.properties, ["os.name", "user.dir", "os.name"]);
        assert_eq!(config.output.as_deref(), Some(Utf8Path::new("target/junit.xml")));
        assert!(config.serialize_options.insert_line_breaks);
        assert_eq!(config.serialize_options.encoding.label(), "windows-1252");
    }

    #[test]
    fn environment_overrides_file() {
        let dir = Utf8TempDir::new().unwrap();
        let path = write_config(&dir, "newlines = false\n");
        let env: Map<String, String> = [
            ("JUNIT_REPORT_NEWLINES", "true"),
            ("JUNIT_REPORT_PROPERTIES", "os.arch,os.family"),
            ("JUNIT_REPORT_OUTPUT", "out.xml"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let config = BuilderConfig::load_with_env(Some(path.as_path()), env).unwrap();
        assert!(config.serialize_options.insert_line_breaks);
        assert_eq!(config.properties, ["os.arch", "os.family"]);
        assert_eq!(config.output.as_deref(), Some(Utf8Path::new("out.xml")));
    }

    #[test]
    fn unknown_encoding() {
        let dir = Utf8TempDir::new().unwrap();
        let path = write_config(&dir, "encoding = \"EBCDIC\"\n");

        let error = BuilderConfig::load_with_env(Some(path.as_path()), Map::new()).unwrap_err();
        assert!(
            matches!(&error, ConfigError::Encoding(inner) if inner.label() == "EBCDIC"),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn invalid_type_reports_path() {
        let dir = Utf8TempDir::new().unwrap();
        let path = write_config(&dir, "newlines = \"sometimes\"\n");

        let error = BuilderConfig::load_with_env(Some(path.as_path()), Map::new()).unwrap_err();
        match &error {
            ConfigError::Deserialize { error: inner, .. } => {
                assert_eq!(inner.path().to_string(), "newlines");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.to_string().contains(path.as_str()));
    }

    #[test]
    fn missing_file() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let error = BuilderConfig::load_with_env(Some(path.as_path()), Map::new()).unwrap_err();
        assert!(
            matches!(error, ConfigError::Build { .. }),
            "unexpected error: {error:?}"
        );
    }
}
