//! Search and filter engine.
//!
//! A pure function of (posts, query, category, sort mode) to an ordered list of
//! references into the input. Nothing is cached between calls, so it is cheap
//! enough to re-run on every keystroke.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::domain::Post;

const TITLE_WEIGHT: u32 = 10;
const EXCERPT_WEIGHT: u32 = 5;
const CONTENT_WEIGHT: u32 = 3;
const TAG_WEIGHT: u32 = 7;
const AUTHOR_WEIGHT: u32 = 2;

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Weighted match score, descending. Same as `Date` for an empty query.
    #[default]
    Relevance,
    /// Most recent first.
    Date,
    /// Alphabetical by title.
    Title,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortMode::Relevance),
            "date" => Ok(SortMode::Date),
            "title" => Ok(SortMode::Title),
            other => Err(format!("unknown sort mode '{}'", other)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortMode::Relevance => "relevance",
            SortMode::Date => "date",
            SortMode::Title => "title",
        };
        f.write_str(name)
    }
}

/// Parameters of one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Free text; empty means no text filter. Whitespace is matched as typed.
    pub query: String,
    /// Exact category name to keep, if any.
    pub category: Option<String>,
    pub sort: SortMode,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }
}

/// Filter and order `posts` according to `params`.
///
/// Category and text filters combine with AND. Sorts are stable, so ties keep
/// input order.
pub fn search<'a>(posts: &'a [Post], params: &SearchParams) -> Vec<&'a Post> {
    let needle = normalize_query(&params.query);
    let category = params.category.as_deref();

    let mut results: Vec<&Post> = posts
        .iter()
        .filter(|post| category.is_none_or(|c| post.category == c))
        .filter(|post| needle.is_empty() || matches_query(post, &needle))
        .collect();

    match params.sort {
        SortMode::Date => sort_by_date(&mut results),
        SortMode::Title => results.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortMode::Relevance if needle.is_empty() => sort_by_date(&mut results),
        SortMode::Relevance => {
            let mut scored: Vec<(u32, &Post)> = results
                .into_iter()
                .map(|post| (score_normalized(post, &needle), post))
                .collect();
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            results = scored.into_iter().map(|(_, post)| post).collect();
        }
    }

    results
}

/// Whether `query` occurs, case-insensitively, in the title, content,
/// excerpt, author or any tag of `post`. An empty query matches everything.
pub fn matches(post: &Post, query: &str) -> bool {
    let needle = normalize_query(query);
    needle.is_empty() || matches_query(post, &needle)
}

/// Additive relevance score of `post` for `query`.
///
/// Title 10, excerpt 5, content 3, author 2, and 7 for every matching tag.
pub fn relevance_score(post: &Post, query: &str) -> u32 {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return 0;
    }
    score_normalized(post, &needle)
}

/// Locale-style title ordering.
///
/// Letters compare first with accents and case folded away, so `Éclair`
/// sorts between `apple` and `Zebra`. Accents break ties next, then case with
/// lowercase first. Exactly equal titles are the only `Equal` pair.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Lowercase `text` and strip diacritics (NFD, then drop combining marks).
fn base_letters(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn normalize_query(query: &str) -> String {
    query.to_lowercase()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_query(post: &Post, needle: &str) -> bool {
    contains(&post.title, needle)
        || contains(&post.content, needle)
        || contains(&post.excerpt, needle)
        || contains(&post.author, needle)
        || post.tags.iter().any(|tag| contains(tag, needle))
}

fn score_normalized(post: &Post, needle: &str) -> u32 {
    let mut score = 0;
    if contains(&post.title, needle) {
        score += TITLE_WEIGHT;
    }
    if contains(&post.excerpt, needle) {
        score += EXCERPT_WEIGHT;
    }
    if contains(&post.content, needle) {
        score += CONTENT_WEIGHT;
    }
    let tag_hits = post.tags.iter().filter(|tag| contains(tag, needle)).count() as u32;
    score += TAG_WEIGHT * tag_hits;
    if contains(&post.author, needle) {
        score += AUTHOR_WEIGHT;
    }
    score
}

fn sort_by_date(results: &mut [&Post]) {
    results.sort_by(|a, b| b.date.cmp(&a.date));
}
