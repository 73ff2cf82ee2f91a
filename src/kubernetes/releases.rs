// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helm release detection through Helm's storage objects

use crate::constants::helm::{V2_OWNER_LABEL, V2_STORAGE_NAMESPACE, V3_OWNER_LABEL};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{api::ListParams, Api, Client};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Check whether Helm 3 (release Secrets in `namespace`) or Helm 2 (Tiller
/// ConfigMaps in kube-system) has stored a release named `release`.
#[instrument(skip(client))]
pub async fn release_exists(client: &Client, namespace: &str, release: &str) -> kube::Result<bool> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    if has_any(&secrets, &format!("{},name={}", V3_OWNER_LABEL, release)).await? {
        debug!("Found Helm 3 release {}/{}", namespace, release);
        return Ok(true);
    }

    let configmaps: Api<ConfigMap> = Api::namespaced(client.clone(), V2_STORAGE_NAMESPACE);
    if has_any(&configmaps, &format!("{},NAME={}", V2_OWNER_LABEL, release)).await? {
        debug!("Found Helm 2 release {}", release);
        return Ok(true);
    }

    Ok(false)
}

/// A backend we may not read (403) or that doesn't exist (404) holds no release
async fn has_any<K>(api: &Api<K>, selector: &str) -> kube::Result<bool>
where
    K: Clone + DeserializeOwned + Debug,
{
    match api.list(&ListParams::default().labels(selector).limit(1)).await {
        Ok(list) => Ok(!list.items.is_empty()),
        Err(kube::Error::Api(err)) if err.code == 403 || err.code == 404 => {
            debug!("Release lookup with selector {} refused: {}", selector, err.message);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
