// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes API lookups backing the idempotent service account and chart steps.

pub mod namespaces;
pub mod releases;
pub mod service_accounts;

use kube::Client;
use std::collections::BTreeMap;

pub use namespaces::ensure_namespace_exists;
pub use releases::release_exists;
pub use service_accounts::get_service_account_annotations;

/// The cluster state queries the provisioner depends on
#[allow(async_fn_in_trait)]
pub trait ClusterApi {
    /// Annotations of the named service account in the default namespace of the
    /// current context, `None` if the service account does not exist
    async fn service_account_annotations(
        &self,
        name: &str,
    ) -> kube::Result<Option<BTreeMap<String, String>>>;

    async fn ensure_namespace(&self, namespace: &str) -> kube::Result<()>;

    /// Whether Helm has a stored release with this name
    async fn release_exists(&self, namespace: &str, release: &str) -> kube::Result<bool>;
}

impl ClusterApi for Client {
    async fn service_account_annotations(
        &self,
        name: &str,
    ) -> kube::Result<Option<BTreeMap<String, String>>> {
        get_service_account_annotations(self, name).await
    }

    async fn ensure_namespace(&self, namespace: &str) -> kube::Result<()> {
        ensure_namespace_exists(self, namespace).await
    }

    async fn release_exists(&self, namespace: &str, release: &str) -> kube::Result<bool> {
        releases::release_exists(self, namespace, release).await
    }
}
