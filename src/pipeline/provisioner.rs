// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provisioner - runs identity, IAM, service account and chart steps in order,
//! aborting on the first failure.

use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info, instrument, warn};

use crate::arn::{AccountId, PolicyArn, RoleArn};
use crate::aws::{CloudApi, CloudFailure};
use crate::command::{run_checked, CommandRunner};
use crate::config::Config;
use crate::constants::{annotations, iam::TRUSTED_SERVICE};
use crate::error::{BootstrapError, Result};
use crate::kubernetes::ClusterApi;
use crate::pipeline::PipelineState;
use crate::policy::{runner_permissions_policy, trust_policy};
use crate::{helm, kubectl};

/// How the chart ended up in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAction {
    Installed,
    Upgraded,
}

impl fmt::Display for ReleaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseAction::Installed => f.write_str("installed"),
            ReleaseAction::Upgraded => f.write_str("upgraded"),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionReport {
    pub account_id: AccountId,
    pub role_arn: RoleArn,
    pub policy_arn: PolicyArn,
    pub annotation_value: String,
    pub release: ReleaseAction,
}

/// kubectl work needed to bind the service account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ServiceAccountPlan {
    create: bool,
    annotate: bool,
    overwrite: bool,
}

impl ServiceAccountPlan {
    fn full() -> Self {
        Self {
            create: true,
            annotate: true,
            overwrite: false,
        }
    }

    /// Plan against an existing service account's annotations (`None` if absent)
    fn for_existing(existing: Option<&BTreeMap<String, String>>, value: &str) -> Self {
        let Some(existing) = existing else {
            return Self::full();
        };

        match existing.get(annotations::ROLE_ARN) {
            Some(current) if current == value => Self {
                create: false,
                annotate: false,
                overwrite: false,
            },
            Some(_) => Self {
                create: false,
                annotate: true,
                overwrite: true,
            },
            None => Self {
                create: false,
                annotate: true,
                overwrite: false,
            },
        }
    }
}

fn enter_next_stage(state: &mut PipelineState) {
    let stage = state.advance();
    info!("Stage: {}", stage);
}

pub struct Provisioner<C, K, R> {
    config: Config,
    cloud: C,
    cluster: K,
    runner: R,
}

impl<C, K, R> Provisioner<C, K, R>
where
    C: CloudApi,
    K: ClusterApi,
    R: CommandRunner,
{
    pub fn new(config: Config, cloud: C, cluster: K, runner: R) -> Self {
        Self {
            config,
            cloud,
            cluster,
            runner,
        }
    }

    /// Run every step in order
    pub async fn run(&self) -> Result<ProvisionReport> {
        let mut state = PipelineState::new();
        self.run_with_state(&mut state).await
    }

    /// Run every step in order, recording progress in `state`. On failure the
    /// state is moved to `Failed` and keeps whatever was produced before.
    pub async fn run_with_state(&self, state: &mut PipelineState) -> Result<ProvisionReport> {
        match self.run_steps(state).await {
            Ok(report) => {
                info!(
                    "Provisioning complete: role {}, service account {} annotated, release {} {}",
                    report.role_arn, self.config.service_account, self.config.release_name, report.release
                );
                Ok(report)
            }
            Err(e) => {
                error!("Provisioning failed while {}: {}", state.stage, e);
                let created = state.created_resources();
                if !created.is_empty() {
                    warn!("Left in place (no rollback): {}", created.join(", "));
                }
                state.fail();
                Err(e)
            }
        }
    }

    async fn run_steps(&self, state: &mut PipelineState) -> Result<ProvisionReport> {
        info!("Stage: {}", state.stage);
        let account_id = self.resolve_identity().await?;
        state.account_id = Some(account_id.clone());

        enter_next_stage(state);
        let role_arn = self.create_role(&account_id).await?;
        state.role_arn = Some(role_arn.clone());

        enter_next_stage(state);
        let policy_arn = self.create_policy(&account_id).await?;
        state.policy_arn = Some(policy_arn.clone());

        enter_next_stage(state);
        self.attach_policy(&role_arn, &policy_arn).await?;

        enter_next_stage(state);
        let annotation_value = self.bind_service_account(&role_arn).await?;
        state.annotation_value = Some(annotation_value.clone());

        enter_next_stage(state);
        let release = self.deploy_chart().await?;
        state.release = Some(release);

        state.advance();
        Ok(ProvisionReport {
            account_id,
            role_arn,
            policy_arn,
            annotation_value,
            release,
        })
    }

    /// Resolve the account of the active credentials
    #[instrument(skip(self))]
    pub async fn resolve_identity(&self) -> Result<AccountId> {
        let account_id = self
            .cloud
            .caller_account_id()
            .await
            .map_err(|e| BootstrapError::IdentityLookup(e.to_string()))?;

        if account_id.as_str().trim().is_empty() {
            return Err(BootstrapError::IdentityLookup(
                "caller identity has an empty account id".to_string(),
            ));
        }

        info!("Resolved AWS account {}", account_id);
        Ok(account_id)
    }

    /// Create the runner role trusted by the EKS service principal
    #[instrument(skip(self), fields(role = %self.config.role_name))]
    pub async fn create_role(&self, account_id: &AccountId) -> Result<RoleArn> {
        let role = &self.config.role_name;
        let role_error = |source: CloudFailure| BootstrapError::RoleCreation {
            role: role.clone(),
            source,
        };

        let document = trust_policy(TRUSTED_SERVICE)
            .to_json()
            .map_err(|e| role_error(CloudFailure::Api(format!("invalid trust policy: {}", e))))?;

        let role_arn = match self.cloud.create_role(role, &document).await {
            Ok(arn) => {
                info!("Created IAM role {}", arn);
                arn
            }
            Err(CloudFailure::AlreadyExists(_)) if self.config.adopt_existing => {
                info!("IAM role {} already exists, adopting it", role);
                self.cloud.get_role(role).await.map_err(role_error)?
            }
            Err(e) => return Err(role_error(e)),
        };

        let expected = RoleArn::for_role(account_id, role);
        if role_arn != expected {
            warn!(
                "IAM role ARN {} differs from {}, annotating with the actual ARN",
                role_arn, expected
            );
        }

        Ok(role_arn)
    }

    /// Create the runner permissions policy
    #[instrument(skip(self), fields(policy = %self.config.policy_name))]
    pub async fn create_policy(&self, account_id: &AccountId) -> Result<PolicyArn> {
        let policy = &self.config.policy_name;
        let policy_error = |source: CloudFailure| BootstrapError::PolicyCreation {
            policy: policy.clone(),
            source,
        };

        let document = runner_permissions_policy();
        let wildcards = document.wildcard_grants();
        if !wildcards.is_empty() {
            warn!(
                "Policy {} grants {} on all resources",
                policy,
                wildcards.join(", ")
            );
        }
        let document = document
            .to_json()
            .map_err(|e| policy_error(CloudFailure::Api(format!("invalid policy document: {}", e))))?;

        match self
            .cloud
            .create_policy(policy, &self.config.policy_description, &document)
            .await
        {
            Ok(arn) => {
                info!("Created IAM policy {}", arn);
                Ok(arn)
            }
            Err(CloudFailure::AlreadyExists(existing)) if self.config.adopt_existing => {
                let arn = PolicyArn::for_policy(account_id, policy);
                match self.cloud.get_policy(&arn).await {
                    Ok(arn) => {
                        info!("IAM policy {} already exists, adopting it", arn);
                        Ok(arn)
                    }
                    Err(e) => {
                        warn!("Existing policy lookup for {} failed: {}", arn, e);
                        Err(policy_error(CloudFailure::AlreadyExists(existing)))
                    }
                }
            }
            Err(e) => Err(policy_error(e)),
        }
    }

    /// Attach the policy to the role; attaching twice is a no-op
    #[instrument(skip(self))]
    pub async fn attach_policy(&self, role_arn: &RoleArn, policy_arn: &PolicyArn) -> Result<()> {
        let role = &self.config.role_name;
        self.cloud
            .attach_role_policy(role, policy_arn)
            .await
            .map_err(|source| BootstrapError::Attachment {
                role: role.clone(),
                policy_arn: policy_arn.to_string(),
                source,
            })?;

        info!("Attached policy {} to role {}", policy_arn, role_arn);
        Ok(())
    }

    /// Create the service account and annotate it with the role ARN. Returns the
    /// annotation value.
    #[instrument(skip(self), fields(service_account = %self.config.service_account))]
    pub async fn bind_service_account(&self, role_arn: &RoleArn) -> Result<String> {
        let name = &self.config.service_account;
        let value = role_arn.to_string();
        let account_error = |reason: String| BootstrapError::ServiceAccount {
            name: name.clone(),
            reason,
        };

        let plan = if self.config.adopt_existing {
            let existing = self
                .cluster
                .service_account_annotations(name)
                .await
                .map_err(|e| account_error(format!("lookup failed: {}", e)))?;
            ServiceAccountPlan::for_existing(existing.as_ref(), &value)
        } else {
            ServiceAccountPlan::full()
        };

        if plan.create {
            run_checked(&self.runner, &kubectl::create_service_account(name))
                .await
                .map_err(|e| account_error(e.to_string()))?;
            info!("Created service account {}", name);
        } else {
            info!("Service account {} already exists", name);
        }

        if plan.annotate {
            if plan.overwrite {
                warn!(
                    "Service account {} is bound to another role, overwriting {}",
                    name,
                    annotations::ROLE_ARN
                );
            }
            let invocation =
                kubectl::annotate_service_account(name, annotations::ROLE_ARN, &value, plan.overwrite);
            run_checked(&self.runner, &invocation)
                .await
                .map_err(|e| account_error(e.to_string()))?;
            info!("Annotated service account {} with {}", name, value);
        } else {
            info!("Service account {} already bound to {}", name, value);
        }

        Ok(value)
    }

    /// Register the chart repository and install (or upgrade) the release
    #[instrument(skip(self), fields(release = %self.config.release_name, namespace = %self.config.namespace))]
    pub async fn deploy_chart(&self) -> Result<ReleaseAction> {
        let release = &self.config.release_name;
        let namespace = &self.config.namespace;
        let chart_error = |reason: String| BootstrapError::ChartDeployment {
            release: release.clone(),
            reason,
        };

        run_checked(&self.runner, &helm::repo_add(&self.config))
            .await
            .map_err(|e| chart_error(e.to_string()))?;
        info!(
            "Registered chart repository {} ({})",
            self.config.chart_repo_alias, self.config.chart_repo_url
        );

        let existing = if self.config.adopt_existing {
            self.cluster
                .release_exists(namespace, release)
                .await
                .map_err(|e| chart_error(format!("release lookup failed: {}", e)))?
        } else {
            false
        };

        match self.cluster.ensure_namespace(namespace).await {
            Ok(()) => {}
            // Namespace access forbidden, helm install fails on its own if it is missing
            Err(kube::Error::Api(err)) if err.code == 403 => {
                warn!(
                    "Not allowed to check namespace {} ({}), leaving it to helm",
                    namespace, err.message
                );
            }
            Err(e) => return Err(chart_error(format!("namespace {}: {}", namespace, e))),
        }

        let (invocation, action) = if existing {
            info!("Release {} exists, upgrading", release);
            (helm::upgrade(&self.config), ReleaseAction::Upgraded)
        } else {
            (helm::install(&self.config), ReleaseAction::Installed)
        };

        run_checked(&self.runner, &invocation)
            .await
            .map_err(|e| chart_error(e.to_string()))?;
        info!(
            "Release {} {} in namespace {} (chart {} {})",
            release, action, namespace, self.config.chart_name, self.config.chart_version
        );

        Ok(action)
    }
}
