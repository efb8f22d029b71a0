//! GitHub credential resolution.
//!
//! A static token wins when configured. Otherwise a GitHub App JWT is minted
//! from the app id and its private key. With neither, requests go out
//! anonymously. Key or signing failures degrade to anonymous access and are
//! reported through [`Credential::Degraded`].

use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::secrets::SecretStore;
use crate::{Config, Error, Result};

/// Validity window of a minted app assertion, in seconds.
pub const ASSERTION_TTL_SECS: i64 = 600;

/// A cached assertion is replaced once it is this close to expiring.
const REFRESH_MARGIN_SECS: i64 = 60;

/// JWT claims GitHub expects from an app.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppClaims {
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Issuer (the app id)
    pub iss: String,
}

/// Where the app's private key PEM lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    File(PathBuf),
    Secret(String),
}

/// Outcome of a resolution.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Static token
    Token(String),
    /// Minted app assertion and its expiry (unix seconds)
    AppJwt { assertion: String, expires_at: i64 },
    /// Nothing configured
    Anonymous,
    /// App credentials configured but unusable; requests go out anonymously
    Degraded(String),
}

impl Credential {
    /// Value for the `Authorization` header, if any.
    pub fn authorization(&self) -> Option<String> {
        match self {
            Credential::Token(token) => Some(format!("token {}", token)),
            Credential::AppJwt { assertion, .. } => Some(format!("Bearer {}", assertion)),
            Credential::Anonymous | Credential::Degraded(_) => None,
        }
    }

    /// Why app credentials could not be used.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Credential::Degraded(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(_) => f.write_str("Token(<redacted>)"),
            Credential::AppJwt { expires_at, .. } => f
                .debug_struct("AppJwt")
                .field("expires_at", expires_at)
                .finish_non_exhaustive(),
            Credential::Anonymous => f.write_str("Anonymous"),
            Credential::Degraded(reason) => f.debug_tuple("Degraded").field(reason).finish(),
        }
    }
}

struct AppIdentity {
    app_id: String,
    key_source: KeySource,
}

/// Produces the credential attached to every upstream call.
pub struct CredentialResolver {
    token: Option<String>,
    app: Option<AppIdentity>,
    secrets: Option<SecretStore>,
    cached: Mutex<Option<(String, i64)>>,
}

impl CredentialResolver {
    /// Create a resolver. `secrets` is only consulted for [`KeySource::Secret`].
    pub fn new(config: &Config, secrets: Option<SecretStore>) -> Self {
        let key_source = config
            .private_key_path
            .clone()
            .map(KeySource::File)
            .or_else(|| config.private_key_secret_arn.clone().map(KeySource::Secret));

        let app = match (&config.app_id, key_source) {
            (Some(app_id), Some(key_source)) => Some(AppIdentity {
                app_id: app_id.clone(),
                key_source,
            }),
            _ => None,
        };

        Self {
            token: config.token.clone(),
            app,
            secrets,
            cached: Mutex::new(None),
        }
    }

    /// Resolve the credential for a request made now.
    pub async fn resolve(&self) -> Credential {
        self.resolve_at(Utc::now().timestamp()).await
    }

    async fn resolve_at(&self, now: i64) -> Credential {
        if let Some(token) = &self.token {
            return Credential::Token(token.clone());
        }

        let Some(app) = &self.app else {
            return Credential::Anonymous;
        };

        let mut cached = self.cached.lock().await;
        if let Some((assertion, expires_at)) = cached.as_ref() {
            if expires_at - now > REFRESH_MARGIN_SECS {
                return Credential::AppJwt {
                    assertion: assertion.clone(),
                    expires_at: *expires_at,
                };
            }
        }

        match self.mint(app, now).await {
            Ok(assertion) => {
                let expires_at = now + ASSERTION_TTL_SECS;
                debug!(app_id = %app.app_id, expires_at, "Minted app assertion");
                *cached = Some((assertion.clone(), expires_at));
                Credential::AppJwt {
                    assertion,
                    expires_at,
                }
            }
            Err(e) => {
                error!("Error generating app JWT: {}", e);
                *cached = None;
                Credential::Degraded(e.to_string())
            }
        }
    }

    async fn mint(&self, app: &AppIdentity, now: i64) -> Result<String> {
        let pem = self.load_key(&app.key_source).await?;
        let minted = mint_app_jwt(&app.app_id, &pem, now);

        // A secret that fails to parse may have been rotated; fetch it again next time.
        if minted.is_err() {
            if let (KeySource::Secret(_), Some(secrets)) = (&app.key_source, &self.secrets) {
                warn!("Discarding cached private key after signing failure");
                secrets.clear_cache().await;
            }
        }

        minted
    }

    async fn load_key(&self, source: &KeySource) -> Result<String> {
        match source {
            KeySource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                Error::Credential(format!(
                    "Failed to read private key {}: {}",
                    path.display(),
                    e
                ))
            }),
            KeySource::Secret(arn) => match &self.secrets {
                Some(secrets) => secrets.get_secret(arn).await,
                None => Err(Error::Credential(
                    "Private key secret configured without a secret store".to_string(),
                )),
            },
        }
    }
}

/// Sign an RS256 app assertion valid for [`ASSERTION_TTL_SECS`] from `now`.
pub fn mint_app_jwt(app_id: &str, private_key_pem: &str, now: i64) -> Result<String> {
    let claims = AppClaims {
        iat: now,
        exp: now + ASSERTION_TTL_SECS,
        iss: app_id.to_string(),
    };

    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())?;
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
}
