// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! IAM policy documents for the runner role.

use serde::{Deserialize, Serialize};

use crate::constants::iam::{ASSUME_ROLE_ACTION, POLICY_VERSION};

/// Services the runner may fully manage on any resource
pub const RUNNER_SERVICES: [&str; 9] = [
    "ec2",
    "elasticloadbalancing",
    "autoscaling",
    "cloudwatch",
    "s3",
    "sns",
    "sqs",
    "rds",
    "route53",
];

/// IAM actions the runner needs to hand roles to the instances it launches
pub const RUNNER_IAM_ACTIONS: [&str; 4] = [
    "iam:PassRole",
    "iam:GetRole",
    "iam:ListInstanceProfiles",
    "iam:ListRoles",
];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Actions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Actions {
    One(String),
    Many(Vec<String>),
}

impl Actions {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let actions: &[String] = match self {
            Actions::One(action) => std::slice::from_ref(action),
            Actions::Many(actions) => actions,
        };
        actions.iter().map(String::as_str)
    }
}

impl PolicyDocument {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Allowed `service:*` actions granted on every resource
    pub fn wildcard_grants(&self) -> Vec<&str> {
        self.statement
            .iter()
            .filter(|s| s.effect == Effect::Allow && s.resource.as_deref() == Some("*"))
            .flat_map(|s| s.action.iter())
            .filter(|action| action.ends_with(":*"))
            .collect()
    }
}

/// Trust policy letting `service` assume the role
pub fn trust_policy(service: &str) -> PolicyDocument {
    PolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: vec![Statement {
            effect: Effect::Allow,
            principal: Some(Principal {
                service: service.to_string(),
            }),
            action: Actions::One(ASSUME_ROLE_ACTION.to_string()),
            resource: None,
        }],
    }
}

/// Permissions granted to the GitLab Runner role
pub fn runner_permissions_policy() -> PolicyDocument {
    let actions = RUNNER_SERVICES
        .iter()
        .map(|service| format!("{}:*", service))
        .chain(RUNNER_IAM_ACTIONS.iter().map(|action| action.to_string()))
        .collect();

    PolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: vec![Statement {
            effect: Effect::Allow,
            principal: None,
            action: Actions::Many(actions),
            resource: Some("*".to_string()),
        }],
    }
}
