// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! helm command lines for the chart deployment.

use crate::command::Invocation;
use crate::config::Config;

/// `helm repo add <alias> <url>`
pub fn repo_add(config: &Config) -> Invocation {
    Invocation::new("helm").args([
        "repo",
        "add",
        config.chart_repo_alias.as_str(),
        config.chart_repo_url.as_str(),
    ])
}

/// `helm install --name <release> --namespace <ns> --values <file> <chart> --version <version>`
pub fn install(config: &Config) -> Invocation {
    Invocation::new("helm")
        .args(["install", "--name", config.release_name.as_str()])
        .args(["--namespace", config.namespace.as_str()])
        .arg("--values")
        .arg(config.values_file.to_string_lossy())
        .arg(config.chart_name.as_str())
        .args(["--version", config.chart_version.as_str()])
}

/// `helm upgrade <release> <chart> --namespace <ns> --values <file> --version <version>`
pub fn upgrade(config: &Config) -> Invocation {
    Invocation::new("helm")
        .args([
            "upgrade",
            config.release_name.as_str(),
            config.chart_name.as_str(),
        ])
        .args(["--namespace", config.namespace.as_str()])
        .arg("--values")
        .arg(config.values_file.to_string_lossy())
        .args(["--version", config.chart_version.as_str()])
}
