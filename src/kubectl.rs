// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! kubectl command lines for the service account binding.

use crate::command::Invocation;

/// `kubectl create serviceaccount <name>`
pub fn create_service_account(name: &str) -> Invocation {
    Invocation::new("kubectl").args(["create", "serviceaccount", name])
}

/// `kubectl annotate serviceaccount <name> <key>=<value>`, with `--overwrite`
/// appended when replacing a different existing value
pub fn annotate_service_account(name: &str, key: &str, value: &str, overwrite: bool) -> Invocation {
    let invocation = Invocation::new("kubectl")
        .args(["annotate", "serviceaccount", name])
        .arg(format!("{}={}", key, value));

    if overwrite {
        invocation.arg("--overwrite")
    } else {
        invocation
    }
}
