// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AWS SDK configuration and credential checks

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_sts::error::DisplayErrorContext;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::{BootstrapError, Result};

/// Load the SDK configuration for the configured region using the default
/// credential chain. Retries are disabled and every operation is bounded by
/// the API timeout.
pub async fn load_sdk_config(config: &Config) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .retry_config(RetryConfig::disabled())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.api_timeout())
                .build(),
        )
        .load()
        .await
}

/// Resolve credentials once so a missing or broken credential chain fails
/// before any API call is attempted.
#[instrument(skip(sdk_config))]
pub async fn verify_credentials(sdk_config: &SdkConfig) -> Result<()> {
    let Some(provider) = sdk_config.credentials_provider() else {
        return Err(BootstrapError::Authentication(
            "no credentials provider configured".to_string(),
        ));
    };

    provider.provide_credentials().await.map_err(|e| {
        BootstrapError::Authentication(format!("{}", DisplayErrorContext(&e)))
    })?;

    debug!("Resolved AWS credentials");
    Ok(())
}
