// ABOUTME: Environment-file configuration for the migrate command
// ABOUTME: Parses KEY=VALUE files into an explicit map instead of the process environment

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Env-file key naming the remote database
pub const DATABASE_NAME_KEY: &str = "TURSO_DATABASE_NAME";

/// Key/value settings loaded from an environment file
///
/// The values are never written into the process environment. Callers that
/// need them (the external shell) receive this map explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    values: BTreeMap<String, String>,
}

impl EnvConfig {
    /// Parse `KEY=VALUE` lines
    ///
    /// Lines are trimmed; blank lines, `#` comments and lines without `=` are
    /// skipped. One layer of surrounding double quotes is stripped from values.
    /// A repeated key keeps its last value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use repodb_tools::config::EnvConfig;
    /// let config = EnvConfig::parse("# comment\nTOKEN=\"abc\"\nnot a setting\n");
    /// assert_eq!(config.get("TOKEN"), Some("abc"));
    /// assert_eq!(config.len(), 1);
    /// ```
    pub fn parse(contents: &str) -> Self {
        let mut values = BTreeMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            values.insert(key.to_string(), strip_quotes(value).to_string());
        }

        Self { values }
    }

    /// Load an environment file, returning an empty config if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No environment file at {}", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read environment file {}", path.display()))?;
        let config = Self::parse(&contents);

        tracing::debug!(
            "Loaded {} setting(s) from {}",
            config.len(),
            path.display()
        );

        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
