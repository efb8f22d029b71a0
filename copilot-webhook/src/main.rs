//! Copilot Webhook Lambda - Answers GitHub questions in chat.
//!
//! Endpoints:
//! - POST /chat (also /copilot/chat) - Interpret a chat message and reply
//! - GET /health - Liveness check, never calls GitHub

use lambda_http::http::Method;
use lambda_http::request::RequestContext;
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use shared::http::{error_for, error_response, json_response, parse_json_body};
use shared::{
    Assistant, ChatRequest, ChatResponse, Config, CredentialResolver, GitHubClient,
    HealthResponse, SecretStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    assistant: Assistant,
}

impl AppState {
    async fn new(config: &Config) -> Result<Self, Error> {
        if !config.has_credentials() {
            warn!("No GitHub authentication configured");
            warn!("Set either GITHUB_TOKEN or GitHub App credentials");
        }

        let secrets = match (&config.private_key_path, &config.private_key_secret_arn) {
            (None, Some(_)) => Some(SecretStore::from_env().await),
            _ => None,
        };

        let credentials = CredentialResolver::new(config, secrets);
        let github = GitHubClient::new(config, credentials)?;

        Ok(Self {
            assistant: Assistant::new(github),
        })
    }
}

/// API Gateway stage of the invocation, if the context carries one.
fn stage(event: &Request) -> Option<String> {
    match event.request_context_ref()? {
        RequestContext::ApiGatewayV1(ctx) => ctx.stage.clone(),
        RequestContext::ApiGatewayV2(ctx) => ctx.stage.clone(),
        _ => None,
    }
}

/// Route path with the stage prefix and any trailing slash removed.
///
/// REST API deployments include the stage in the path (`/prod/chat`).
fn route_path<'a>(raw_path: &'a str, stage: Option<&str>) -> &'a str {
    let path = stage
        .filter(|s| !s.is_empty() && *s != "$default")
        .and_then(|s| {
            raw_path
                .strip_prefix('/')
                .and_then(|p| p.strip_prefix(s))
                .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .unwrap_or(raw_path);

    path.trim_end_matches('/')
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let stage = stage(&event);
    let path = route_path(event.uri().path(), stage.as_deref());

    let response = match (event.method(), path) {
        (&Method::POST, "/chat" | "/copilot/chat") => chat(&state, &event).await,
        (&Method::GET, "/health") => json_response(200, &HealthResponse::healthy()),
        (_, "/chat" | "/copilot/chat" | "/health") => {
            Ok(error_response(405, "Method not allowed"))
        }
        _ => Ok(error_response(404, format!("No route for {}", path))),
    };

    Ok(response.unwrap_or_else(|e| {
        error!("Request failed: {}", e);
        error_for(&e)
    }))
}

async fn chat(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    let request: ChatRequest = parse_json_body(event.body())?;
    let message = request.text();

    info!("Processing chat message ({} chars)", message.len());

    let reply = state.assistant.respond(message).await;
    json_response(200, &ChatResponse::new(reply))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::new(&config).await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
