// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys
pub mod annotations {
    /// Binds a service account to an IAM role (IRSA)
    pub const ROLE_ARN: &str = "eks.amazonaws.com/role-arn";
}

/// IAM identifiers and document constants
pub mod iam {
    /// Service principal trusted by the runner role
    pub const TRUSTED_SERVICE: &str = "eks.amazonaws.com";
    pub const ASSUME_ROLE_ACTION: &str = "sts:AssumeRole";
    pub const POLICY_VERSION: &str = "2012-10-17";
}

/// Labels Helm puts on its release storage objects
pub mod helm {
    /// Helm 3 keeps releases in Secrets in the release namespace
    pub const V3_OWNER_LABEL: &str = "owner=helm";
    /// Helm 2 (Tiller) keeps releases in ConfigMaps in kube-system
    pub const V2_OWNER_LABEL: &str = "OWNER=TILLER";
    pub const V2_STORAGE_NAMESPACE: &str = "kube-system";
}

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "RUNNER_BOOTSTRAP_";
