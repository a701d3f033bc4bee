use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "tandem.toml";

/// Project settings read from `tandem.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output directory, relative to the config file.
    pub out_dir: Option<PathBuf>,
    /// Document title of the generated pages.
    pub title: Option<String>,
    pub lang: Option<String>,
    /// Treat template warnings as errors.
    pub strict: bool,
    /// Write one page per router option next to `index.html`.
    pub prerender_routes: bool,
}

impl Config {
    pub fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid tandem config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config =
            Self::parse(&source).with_context(|| format!("in {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.out_dir = config
                .out_dir
                .take()
                .map(|out| if out.is_relative() { base.join(out) } else { out });
        }
        Ok(config)
    }

    /// `explicit` must exist; otherwise `tandem.toml` beside the entry file is used
    /// when present.
    pub fn discover(entry: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let beside = entry
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_FILE);
        if beside.is_file() {
            tracing::debug!(path = %beside.display(), "using config");
            Self::load(&beside)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn reads_every_key() {
        let config = Config::parse(
            r#"
out_dir = "public"
title = "Shop"
lang = "fr"
strict = true
prerender_routes = true
"#,
        )
        .unwrap();
        assert_eq!(config.out_dir, Some(PathBuf::from("public")));
        assert_eq!(config.title.as_deref(), Some("Shop"));
        assert_eq!(config.lang.as_deref(), Some("fr"));
        assert!(config.strict);
        assert!(config.prerender_routes);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("outdir = \"x\"").is_err());
    }
}
