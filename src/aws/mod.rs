// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AWS session, identity and IAM access.

pub mod client;
pub mod session;

use thiserror::Error;

use crate::arn::{AccountId, PolicyArn, RoleArn};

pub use client::AwsCloud;
pub use session::{load_sdk_config, verify_credentials};

/// Classified failure of a single AWS call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudFailure {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Api(String),
}

/// The AWS operations the provisioner depends on
#[allow(async_fn_in_trait)]
pub trait CloudApi {
    /// Account of the credentials in use (STS GetCallerIdentity)
    async fn caller_account_id(&self) -> Result<AccountId, CloudFailure>;

    async fn create_role(
        &self,
        role_name: &str,
        trust_policy: &str,
    ) -> Result<RoleArn, CloudFailure>;

    async fn get_role(&self, role_name: &str) -> Result<RoleArn, CloudFailure>;

    async fn create_policy(
        &self,
        policy_name: &str,
        description: &str,
        document: &str,
    ) -> Result<PolicyArn, CloudFailure>;

    async fn get_policy(&self, policy_arn: &PolicyArn) -> Result<PolicyArn, CloudFailure>;

    async fn attach_role_policy(
        &self,
        role_name: &str,
        policy_arn: &PolicyArn,
    ) -> Result<(), CloudFailure>;
}
