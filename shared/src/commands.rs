//! Chat command interpretation.
//!
//! Classification is ordered substring matching on the lower-cased message;
//! the first rule that matches wins:
//!
//! 1. `user` and `info` → [`Intent::UserInfo`]
//! 2. `repo` and `info` → [`Intent::RepoInfo`]
//! 3. `search` → [`Intent::Search`]
//! 4. anything else → [`Intent::Help`]
//!
//! Arguments are read at a fixed offset from the FIRST whitespace token equal
//! to the keyword. A keyword that only appears inside a longer word
//! ("username", "researching") classifies but yields no argument, and a
//! message that repeats the keyword reads its argument relative to the first
//! occurrence.

/// Owner and name of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

/// The classified purpose of a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    UserInfo(Option<String>),
    RepoInfo(Option<RepoRef>),
    Search(Option<String>),
    Help,
}

/// Classify a message and extract its argument.
pub fn classify(message: &str) -> Intent {
    let text = message.to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();

    if text.contains("user") && text.contains("info") {
        Intent::UserInfo(word_after(&words, "user", 2).map(str::to_string))
    } else if text.contains("repo") && text.contains("info") {
        Intent::RepoInfo(word_after(&words, "repo", 2).and_then(parse_repo))
    } else if text.contains("search") {
        Intent::Search(rest_after(&words, "search"))
    } else {
        Intent::Help
    }
}

fn keyword_index(words: &[&str], keyword: &str) -> Option<usize> {
    words.iter().position(|w| *w == keyword)
}

fn word_after<'a>(words: &[&'a str], keyword: &str, offset: usize) -> Option<&'a str> {
    keyword_index(words, keyword).and_then(|i| words.get(i + offset).copied())
}

fn rest_after(words: &[&str], keyword: &str) -> Option<String> {
    let start = keyword_index(words, keyword)? + 1;
    if start >= words.len() {
        return None;
    }
    Some(words[start..].join(" "))
}

fn parse_repo(word: &str) -> Option<RepoRef> {
    word.split_once('/').map(|(owner, name)| RepoRef {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
