//! Chat pipeline: interpret the message, call GitHub, render the reply.

use tracing::{info, warn};

use crate::commands::{classify, Intent, RepoRef};
use crate::format;
use crate::github::{GitHubClient, Lookup};
use crate::Result;

/// Answers chat messages using the GitHub API.
pub struct Assistant {
    github: GitHubClient,
}

impl Assistant {
    pub fn new(github: GitHubClient) -> Self {
        Self { github }
    }

    /// Produce the reply text for one message.
    ///
    /// Upstream misses and transport failures both render as "not found";
    /// the distinction is only visible in the logs.
    pub async fn respond(&self, message: &str) -> String {
        let intent = classify(message);
        info!(?intent, "Classified chat message");

        match intent {
            Intent::UserInfo(None) => format::USERNAME_GUIDANCE.to_string(),
            Intent::UserInfo(Some(username)) => {
                match found_or_log(self.github.fetch_user(&username).await, "user") {
                    Some(user) => format::user_info(&user),
                    None => format::user_not_found(&username),
                }
            }
            Intent::RepoInfo(None) => format::REPO_GUIDANCE.to_string(),
            Intent::RepoInfo(Some(RepoRef { owner, name })) => {
                match found_or_log(self.github.fetch_repo(&owner, &name).await, "repository") {
                    Some(repo) => format::repo_info(&repo),
                    None => format::repo_not_found(&owner, &name),
                }
            }
            Intent::Search(None) => format::SEARCH_GUIDANCE.to_string(),
            Intent::Search(Some(query)) => {
                let results = found_or_log(self.github.search_repos(&query).await, "search");
                let items = results.as_ref().and_then(|r| r.items.as_deref());
                format::search_results(&query, items)
            }
            Intent::Help => format::help_message().to_string(),
        }
    }
}

fn found_or_log<T>(result: Result<Lookup<T>>, what: &str) -> Option<T> {
    match result {
        Ok(Lookup::Found(value)) => Some(value),
        Ok(Lookup::Miss { status }) => {
            info!(status, "GitHub {} lookup missed", what);
            None
        }
        Err(e) => {
            warn!("GitHub {} lookup failed: {}", what, e);
            None
        }
    }
}
