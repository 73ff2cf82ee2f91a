// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::constants::ENV_PREFIX;

/// Provisioning configuration. Defaults reproduce the fixed GitLab Runner setup,
/// any field can be overridden from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub region: String,
    pub role_name: String,
    pub policy_name: String,
    pub policy_description: String,
    /// Created in the default namespace of the current kubectl context
    pub service_account: String,
    pub chart_repo_alias: String,
    pub chart_repo_url: String,
    pub chart_name: String,
    pub chart_version: String,
    pub release_name: String,
    pub namespace: String,
    pub values_file: PathBuf,
    /// Reuse a role, policy, service account or release left by an earlier run
    pub adopt_existing: bool,
    pub command_timeout_secs: u64,
    pub api_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            region: "eu-west-1".to_string(),
            role_name: "GitLabRunnerRole".to_string(),
            policy_name: "GitLabRunnerRolePolicy".to_string(),
            policy_description: "GitLab Runner role policy".to_string(),
            service_account: "gitlab-runner".to_string(),
            chart_repo_alias: "gitlab".to_string(),
            chart_repo_url: "https://charts.gitlab.io".to_string(),
            chart_name: "gitlab-runner".to_string(),
            chart_version: "0.1.0".to_string(),
            release_name: "gitlab-runner".to_string(),
            namespace: "gitlab-runner".to_string(),
            values_file: PathBuf::from("values.yaml"),
            adopt_existing: true,
            command_timeout_secs: 300,
            api_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from defaults overridden by `lookup`, which is
    /// queried with the full variable name (e.g. `RUNNER_BOOTSTRAP_REGION`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let defaults = Config::default();

        Ok(Config {
            region: var("REGION").unwrap_or(defaults.region),
            role_name: var("ROLE_NAME").unwrap_or(defaults.role_name),
            policy_name: var("POLICY_NAME").unwrap_or(defaults.policy_name),
            policy_description: var("POLICY_DESCRIPTION").unwrap_or(defaults.policy_description),
            service_account: var("SERVICE_ACCOUNT").unwrap_or(defaults.service_account),
            chart_repo_alias: var("CHART_REPO_ALIAS").unwrap_or(defaults.chart_repo_alias),
            chart_repo_url: var("CHART_REPO_URL").unwrap_or(defaults.chart_repo_url),
            chart_name: var("CHART_NAME").unwrap_or(defaults.chart_name),
            chart_version: var("CHART_VERSION").unwrap_or(defaults.chart_version),
            release_name: var("RELEASE_NAME").unwrap_or(defaults.release_name),
            namespace: var("NAMESPACE").unwrap_or(defaults.namespace),
            values_file: var("VALUES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.values_file),
            adopt_existing: parse_var(&var, "ADOPT_EXISTING", defaults.adopt_existing)?,
            command_timeout_secs: parse_var(
                &var,
                "COMMAND_TIMEOUT_SECS",
                defaults.command_timeout_secs,
            )?,
            api_timeout_secs: parse_var(&var, "API_TIMEOUT_SECS", defaults.api_timeout_secs)?,
        })
    }

    /// Reject configurations that would fail halfway through provisioning
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("region", &self.region),
            ("role name", &self.role_name),
            ("policy name", &self.policy_name),
            ("service account", &self.service_account),
            ("chart repository alias", &self.chart_repo_alias),
            ("chart name", &self.chart_name),
            ("chart version", &self.chart_version),
            ("release name", &self.release_name),
            ("namespace", &self.namespace),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                bail!("{} must not be empty", field);
            }
        }

        let repo_url = Url::parse(&self.chart_repo_url)
            .with_context(|| format!("invalid chart repository URL '{}'", self.chart_repo_url))?;
        if !matches!(repo_url.scheme(), "http" | "https") {
            bail!(
                "chart repository URL '{}' must use http or https",
                self.chart_repo_url
            );
        }

        if self.command_timeout_secs == 0 || self.api_timeout_secs == 0 {
            bail!("timeouts must be greater than zero");
        }

        if !self.values_file.is_file() {
            bail!("values file '{}' not found", self.values_file.display());
        }

        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

fn parse_var<T, F>(var: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{}{} has invalid value '{}'", ENV_PREFIX, name, raw)),
        None => Ok(default),
    }
}
