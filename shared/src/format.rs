//! Text templates for chat responses.

use crate::github::{RepoRecord, UserRecord};

/// Search results shown per response.
pub const MAX_SEARCH_RESULTS: usize = 5;

pub const USERNAME_GUIDANCE: &str = "Please specify a username. Example: 'user info octocat'";
pub const REPO_GUIDANCE: &str =
    "Please specify a repository. Example: 'repo info microsoft/vscode'";
pub const SEARCH_GUIDANCE: &str =
    "Please specify a search query. Example: 'search python web framework'";

const HELP: &str = "**GitHub Copilot Assistant Commands:**

• `user info <username>` - Get user information
• `repo info <owner/repo>` - Get repository details
• `search <query>` - Search repositories

**Examples:**
• user info octocat
• repo info microsoft/vscode
• search python web framework";

/// Static command reference.
pub fn help_message() -> &'static str {
    HELP
}

pub fn user_info(user: &UserRecord) -> String {
    let display_name = non_blank(user.name.as_deref()).unwrap_or(&user.login);

    format!(
        "**{}** (@{})\n📍 {}\n📊 {} public repos\n👥 {} followers, {} following\n🔗 {}",
        display_name,
        user.login,
        non_blank(user.location.as_deref()).unwrap_or("Not specified"),
        user.public_repos,
        user.followers,
        user.following,
        user.html_url,
    )
}

pub fn user_not_found(username: &str) -> String {
    format!("User '{}' not found.", username)
}

pub fn repo_info(repo: &RepoRecord) -> String {
    format!(
        "**{}**\n📝 {}\n⭐ {} stars\n🍴 {} forks\n📅 Updated: {}\n🔗 {}",
        repo.full_name,
        description(repo),
        repo.stargazers_count,
        repo.forks_count,
        date_part(repo.updated_at.as_deref().unwrap_or("")),
        repo.html_url,
    )
}

pub fn repo_not_found(owner: &str, name: &str) -> String {
    format!("Repository '{}/{}' not found.", owner, name)
}

/// Render search hits; `None` or an empty list falls back to the miss text.
pub fn search_results(query: &str, items: Option<&[RepoRecord]>) -> String {
    let items = match items {
        Some(items) if !items.is_empty() => items,
        _ => return no_search_results(query),
    };

    let mut out = String::from("**Search Results:**\n\n");
    for repo in items.iter().take(MAX_SEARCH_RESULTS) {
        out.push_str(&format!(
            "• **{}** ({} ⭐)\n  {}\n\n",
            repo.full_name,
            repo.stargazers_count,
            description(repo)
        ));
    }
    out
}

pub fn no_search_results(query: &str) -> String {
    format!("No repositories found for '{}'", query)
}

fn description(repo: &RepoRecord) -> &str {
    non_blank(repo.description.as_deref()).unwrap_or("No description")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// First ten characters of an ISO-8601 timestamp.
fn date_part(timestamp: &str) -> &str {
    match timestamp.char_indices().nth(10) {
        Some((end, _)) => &timestamp[..end],
        None => timestamp,
    }
}
