//! Shared library for the Copilot chat webhook.
//!
//! This crate provides the configuration, credentials, GitHub client, command
//! interpreter and response templates used by the webhook Lambda.

pub mod assistant;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod github;
pub mod http;
pub mod models;
pub mod secrets;

pub use assistant::Assistant;
pub use auth::{mint_app_jwt, AppClaims, Credential, CredentialResolver, KeySource};
pub use commands::{classify, Intent, RepoRef};
pub use config::Config;
pub use error::{Error, Result};
pub use github::{GitHubClient, Lookup, RepoRecord, SearchResults, UserRecord};
pub use models::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};
pub use secrets::SecretStore;
