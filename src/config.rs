//! Connection settings resolution.
//!
//! Flags and environment variables (merged by clap) win over the profile
//! file, which wins over the built-in default URL. The resolved settings
//! are constructed once per invocation and passed down explicitly; there
//! is no process-wide client state.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::cli::Cli;
use converge::ApplyContext;
use tfapi::client::DEFAULT_URL;
use tfapi::{Client, Connection, RetryPolicy};

/// Get the config file path
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("tfsync").join("config.toml"))
}

/// Parsed `config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: HashMap<String, Profile>,
}

/// One `[profile.<name>]` table.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Profile {
    pub url: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub insecure: bool,
}

impl Config {
    /// Load config.toml; a missing file is an empty config.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse config.toml content.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config.toml format")
    }

    /// Find a profile by name.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profile.get(name)
    }
}

/// Per-invocation resolved settings.
#[derive(Debug)]
pub struct Settings {
    pub connection: Connection,
    pub retry: RetryPolicy,
    pub dry_run: bool,
}

impl Settings {
    /// Resolve flags, environment, and profile into connection settings.
    ///
    /// An explicitly named profile must exist; the implicit `default`
    /// profile is optional.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let profile = match cli.profile.as_deref() {
            Some(name) => Some(
                config
                    .profile(name)
                    .with_context(|| format!("Profile \"{name}\" not found in config.toml"))?,
            ),
            None => config.profile("default"),
        };

        let url = cli
            .url
            .clone()
            .or_else(|| profile.and_then(|p| p.url.clone()))
            .unwrap_or_else(|| DEFAULT_URL.to_string());

        let Some(token) = cli
            .token
            .clone()
            .or_else(|| profile.and_then(|p| p.token.clone()))
        else {
            bail!("A bearer token is required; pass --token or set TFE_TOKEN");
        };

        let insecure = cli.insecure || profile.is_some_and(|p| p.insecure);

        Ok(Self {
            connection: Connection::new(url, token)
                .insecure(insecure)
                .without_proxy(cli.no_proxy),
            retry: RetryPolicy::new(cli.retries, cli.sleep),
            dry_run: cli.dry_run,
        })
    }

    /// Build the retrying API client for this invocation.
    pub fn client(&self) -> Client {
        Client::new(&self.connection, self.retry)
    }

    /// Build the dry-run-aware apply context for this invocation.
    pub fn apply_context(&self) -> ApplyContext {
        ApplyContext::new(self.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["tfsync"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["org", "list"]);
        Cli::parse_from(argv)
    }

    const CONFIG: &str = r#"
        [profile.default]
        url = "https://tfe.internal.example.com"
        token = "profile-token"

        [profile.lab]
        url = "https://tfe.lab.example.com"
        token = "lab-token"
        insecure = true
    "#;

    #[test]
    fn test_parse_profiles() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!(config.profile.len(), 2);
        assert!(config.profile("lab").unwrap().insecure);
        assert!(config.profile("missing").is_none());
    }

    #[test]
    fn test_flag_wins_over_profile() {
        let config = Config::parse(CONFIG).unwrap();
        let settings = Settings::resolve(
            &cli(&["--url", "https://flag.example.com", "--token", "flag-token"]),
            &config,
        )
        .unwrap();
        assert_eq!(settings.connection.base_url, "https://flag.example.com");
        assert_eq!(settings.connection.token, "flag-token");
    }

    #[test]
    fn test_default_profile_fills_gaps() {
        let config = Config::parse(CONFIG).unwrap();
        let settings = Settings::resolve(&cli(&[]), &config).unwrap();
        assert_eq!(
            settings.connection.base_url,
            "https://tfe.internal.example.com"
        );
        assert_eq!(settings.connection.token, "profile-token");
        assert!(settings.connection.verify_tls);
    }

    #[test]
    fn test_named_profile() {
        let config = Config::parse(CONFIG).unwrap();
        let settings =
            Settings::resolve(&cli(&["--profile", "lab"]), &config).unwrap();
        assert_eq!(settings.connection.base_url, "https://tfe.lab.example.com");
        assert!(!settings.connection.verify_tls);
    }

    #[test]
    fn test_unknown_profile_fails() {
        let config = Config::parse(CONFIG).unwrap();
        let err = Settings::resolve(&cli(&["--profile", "nope"]), &config).unwrap_err();
        assert!(err.to_string().contains("\"nope\" not found"));
    }

    #[test]
    fn test_missing_token_fails() {
        let config = Config::default();
        let err = Settings::resolve(&cli(&[]), &config).unwrap_err();
        assert!(err.to_string().contains("bearer token is required"));
    }

    #[test]
    fn test_retry_settings() {
        let config = Config::parse(CONFIG).unwrap();
        let settings = Settings::resolve(
            &cli(&["--retries", "5", "--sleep", "1", "--dry-run"]),
            &config,
        )
        .unwrap();
        assert_eq!(settings.retry, RetryPolicy::new(5, 1));
        assert!(settings.dry_run);
    }
}
