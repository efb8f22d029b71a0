//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Secrets Manager reader with a per-instance cache.
pub struct SecretStore {
    client: SecretsClient,
    cache: RwLock<HashMap<String, String>>,
}

impl SecretStore {
    pub fn new(client: SecretsClient) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store from the ambient AWS configuration.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(SecretsClient::new(&config))
    }

    /// Get a secret value with caching.
    pub async fn get_secret(&self, secret_arn: &str) -> Result<String> {
        {
            let cache = self.cache.read().await;
            if let Some(value) = cache.get(secret_arn) {
                return Ok(value.clone());
            }
        }

        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_arn)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

        let secret_string = response
            .secret_string()
            .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
            .to_string();

        let mut cache = self.cache.write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());

        Ok(secret_string)
    }

    /// Drop cached values, e.g. after a key rotation.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}
