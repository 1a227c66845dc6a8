//! AWS SDK configuration loading

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use tracing::debug;

use crate::config::{Settings, SettingsError};

/// Load the shared SDK config and make sure credentials resolve
///
/// Credentials are fetched once up front so a broken setup fails at startup
/// instead of on every receive.
pub async fn load_sdk_config(settings: &Settings) -> Result<SdkConfig, SettingsError> {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));
    if let Some(endpoint_url) = &settings.endpoint_url {
        debug!(endpoint = %endpoint_url, "Using endpoint override");
        loader = loader.endpoint_url(endpoint_url);
    }
    let config = loader.load().await;

    let provider = config
        .credentials_provider()
        .ok_or(SettingsError::NoCredentials)?;
    provider
        .provide_credentials()
        .await
        .map_err(|e| SettingsError::Credentials(e.to_string()))?;

    Ok(config)
}
