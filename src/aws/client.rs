// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! STS and IAM clients backed by the AWS SDK

use aws_config::SdkConfig;
use aws_sdk_iam::error::DisplayErrorContext;
use tracing::{debug, info, instrument};

use crate::arn::{AccountId, PolicyArn, RoleArn};
use crate::aws::session::{load_sdk_config, verify_credentials};
use crate::aws::{CloudApi, CloudFailure};
use crate::config::Config;
use crate::error::Result;

/// Authenticated AWS session for a single region
#[derive(Clone, Debug)]
pub struct AwsCloud {
    sts: aws_sdk_sts::Client,
    iam: aws_sdk_iam::Client,
}

impl AwsCloud {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sts: aws_sdk_sts::Client::new(sdk_config),
            iam: aws_sdk_iam::Client::new(sdk_config),
        }
    }

    /// Open a session in the configured region, failing early on missing credentials
    #[instrument(skip(config), fields(region = %config.region))]
    pub async fn connect(config: &Config) -> Result<Self> {
        let sdk_config = load_sdk_config(config).await;
        verify_credentials(&sdk_config).await?;
        info!("AWS session opened in region {}", config.region);
        Ok(Self::new(&sdk_config))
    }
}

impl CloudApi for AwsCloud {
    async fn caller_account_id(&self) -> std::result::Result<AccountId, CloudFailure> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| CloudFailure::Api(format!("{}", DisplayErrorContext(&e))))?;

        output
            .account()
            .map(AccountId::new)
            .ok_or_else(|| CloudFailure::Api("GetCallerIdentity returned no account".to_string()))
    }

    async fn create_role(
        &self,
        role_name: &str,
        trust_policy: &str,
    ) -> std::result::Result<RoleArn, CloudFailure> {
        debug!("Calling CreateRole for {}", role_name);
        let output = self
            .iam
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_entity_already_exists_exception())
                {
                    CloudFailure::AlreadyExists(format!("role {}", role_name))
                } else {
                    CloudFailure::Api(format!("{}", DisplayErrorContext(&e)))
                }
            })?;

        output
            .role()
            .map(|role| RoleArn::new(role.arn()))
            .ok_or_else(|| CloudFailure::Api("CreateRole returned no role".to_string()))
    }

    async fn get_role(&self, role_name: &str) -> std::result::Result<RoleArn, CloudFailure> {
        debug!("Calling GetRole for {}", role_name);
        let output = self
            .iam
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception())
                {
                    CloudFailure::NotFound(format!("role {}", role_name))
                } else {
                    CloudFailure::Api(format!("{}", DisplayErrorContext(&e)))
                }
            })?;

        output
            .role()
            .map(|role| RoleArn::new(role.arn()))
            .ok_or_else(|| CloudFailure::Api("GetRole returned no role".to_string()))
    }

    async fn create_policy(
        &self,
        policy_name: &str,
        description: &str,
        document: &str,
    ) -> std::result::Result<PolicyArn, CloudFailure> {
        debug!("Calling CreatePolicy for {}", policy_name);
        let output = self
            .iam
            .create_policy()
            .policy_name(policy_name)
            .description(description)
            .policy_document(document)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_entity_already_exists_exception())
                {
                    CloudFailure::AlreadyExists(format!("policy {}", policy_name))
                } else {
                    CloudFailure::Api(format!("{}", DisplayErrorContext(&e)))
                }
            })?;

        output
            .policy()
            .and_then(|policy| policy.arn())
            .map(PolicyArn::new)
            .ok_or_else(|| CloudFailure::Api("CreatePolicy returned no policy ARN".to_string()))
    }

    async fn get_policy(
        &self,
        policy_arn: &PolicyArn,
    ) -> std::result::Result<PolicyArn, CloudFailure> {
        debug!("Calling GetPolicy for {}", policy_arn);
        let output = self
            .iam
            .get_policy()
            .policy_arn(policy_arn.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception())
                {
                    CloudFailure::NotFound(format!("policy {}", policy_arn))
                } else {
                    CloudFailure::Api(format!("{}", DisplayErrorContext(&e)))
                }
            })?;

        output
            .policy()
            .and_then(|policy| policy.arn())
            .map(PolicyArn::new)
            .ok_or_else(|| CloudFailure::Api("GetPolicy returned no policy ARN".to_string()))
    }

    async fn attach_role_policy(
        &self,
        role_name: &str,
        policy_arn: &PolicyArn,
    ) -> std::result::Result<(), CloudFailure> {
        debug!("Calling AttachRolePolicy for {} -> {}", policy_arn, role_name);
        self.iam
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception())
                {
                    CloudFailure::NotFound(format!("role {} or policy {}", role_name, policy_arn))
                } else {
                    CloudFailure::Api(format!("{}", DisplayErrorContext(&e)))
                }
            })?;

        Ok(())
    }
}
