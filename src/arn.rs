// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identifiers threaded through the provisioning pipeline.

use std::fmt;

/// Numeric identifier of the active AWS account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountId(String);

/// ARN of an IAM role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleArn(String);

/// ARN of a customer managed IAM policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyArn(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RoleArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    /// The ARN a role named `role_name` gets when created without a path
    pub fn for_role(account: &AccountId, role_name: &str) -> Self {
        Self(format!("arn:aws:iam::{}:role/{}", account, role_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PolicyArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    /// The ARN a policy named `policy_name` gets when created without a path
    pub fn for_policy(account: &AccountId, policy_name: &str) -> Self {
        Self(format!("arn:aws:iam::{}:policy/{}", account, policy_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PolicyArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
