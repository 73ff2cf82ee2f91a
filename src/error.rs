// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

use crate::aws::CloudFailure;
use crate::pipeline::Stage;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("AWS authentication failed: {0}")]
    Authentication(String),

    #[error("Caller identity lookup failed: {0}")]
    IdentityLookup(String),

    #[error("IAM role {role} creation failed: {source}")]
    RoleCreation {
        role: String,
        #[source]
        source: CloudFailure,
    },

    #[error("IAM policy {policy} creation failed: {source}")]
    PolicyCreation {
        policy: String,
        #[source]
        source: CloudFailure,
    },

    #[error("Attaching policy {policy_arn} to role {role} failed: {source}")]
    Attachment {
        role: String,
        policy_arn: String,
        #[source]
        source: CloudFailure,
    },

    #[error("Service account {name} binding failed: {reason}")]
    ServiceAccount { name: String, reason: String },

    #[error("Chart release {release} deployment failed: {reason}")]
    ChartDeployment { release: String, reason: String },
}

impl BootstrapError {
    /// The pipeline stage this error aborts
    pub fn stage(&self) -> Stage {
        match self {
            BootstrapError::Authentication(_)
            | BootstrapError::IdentityLookup(_) => Stage::Resolving,
            BootstrapError::RoleCreation { .. } => Stage::RoleCreating,
            BootstrapError::PolicyCreation { .. } => Stage::PolicyCreating,
            BootstrapError::Attachment { .. } => Stage::PolicyAttaching,
            BootstrapError::ServiceAccount { .. } => Stage::ServiceAccountBinding,
            BootstrapError::ChartDeployment { .. } => Stage::ChartDeploying,
        }
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
