// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pipeline stages and the state threaded between them.

use std::fmt;

use crate::arn::{AccountId, PolicyArn, RoleArn};
use crate::pipeline::ReleaseAction;

/// Position in the provisioning sequence. Stages only move forward; `Failed`
/// is reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Resolving,
    RoleCreating,
    PolicyCreating,
    PolicyAttaching,
    ServiceAccountBinding,
    ChartDeploying,
    Done,
    Failed,
}

impl Stage {
    /// The stage after this one on success
    pub fn next(self) -> Stage {
        match self {
            Stage::Resolving => Stage::RoleCreating,
            Stage::RoleCreating => Stage::PolicyCreating,
            Stage::PolicyCreating => Stage::PolicyAttaching,
            Stage::PolicyAttaching => Stage::ServiceAccountBinding,
            Stage::ServiceAccountBinding => Stage::ChartDeploying,
            Stage::ChartDeploying => Stage::Done,
            Stage::Done => Stage::Done,
            Stage::Failed => Stage::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolving => "resolving caller identity",
            Stage::RoleCreating => "creating IAM role",
            Stage::PolicyCreating => "creating IAM policy",
            Stage::PolicyAttaching => "attaching IAM policy",
            Stage::ServiceAccountBinding => "binding service account",
            Stage::ChartDeploying => "deploying chart",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything the pipeline has produced so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    pub stage: Stage,
    /// Set when the run aborts
    pub failed_at: Option<Stage>,
    pub account_id: Option<AccountId>,
    pub role_arn: Option<RoleArn>,
    pub policy_arn: Option<PolicyArn>,
    pub annotation_value: Option<String>,
    pub release: Option<ReleaseAction>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next stage. No-op once terminal.
    pub fn advance(&mut self) -> Stage {
        self.stage = self.stage.next();
        self.stage
    }

    pub fn fail(&mut self) {
        if !self.stage.is_terminal() {
            self.failed_at = Some(self.stage);
            self.stage = Stage::Failed;
        }
    }

    /// Cloud and cluster objects this run has produced, for manual cleanup
    /// after a failure
    pub fn created_resources(&self) -> Vec<String> {
        let mut resources = Vec::new();
        if let Some(arn) = &self.role_arn {
            resources.push(format!("IAM role {}", arn));
        }
        if let Some(arn) = &self.policy_arn {
            resources.push(format!("IAM policy {}", arn));
        }
        if self.annotation_value.is_some() {
            resources.push("annotated service account".to_string());
        }
        resources
    }
}
