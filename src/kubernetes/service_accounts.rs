// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service account lookups

use k8s_openapi::api::core::v1::ServiceAccount;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Get the annotations of a service account in the client's default namespace.
/// Returns `None` when the service account does not exist.
#[instrument(skip(client))]
pub async fn get_service_account_annotations(
    client: &Client,
    name: &str,
) -> kube::Result<Option<BTreeMap<String, String>>> {
    let accounts: Api<ServiceAccount> = Api::default_namespaced(client.clone());

    let Some(account) = accounts.get_opt(name).await? else {
        debug!("Service account {} not found", name);
        return Ok(None);
    };

    Ok(Some(account.metadata.annotations.unwrap_or_default()))
}
