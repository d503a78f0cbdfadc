use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CategoryList, Identity};
use crate::error::{DomainError, FieldErrors};

/// Image used when a post is created without one.
pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1486312338219-ce68d2c6f44d?w=800&h=400&fit=crop";

/// Read time label used when the draft leaves it blank.
pub const DEFAULT_READ_TIME: &str = "5 min read";

/// Opaque post identifier.
///
/// Remote keys and client-side temporary ids share this type. It is compared
/// by string equality only and never parsed or ordered numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PostId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Flat record stored under a key in the remote collection.
///
/// The key is the post id and is never written inside the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_read_time")]
    pub read_time: String,
    pub author: String,
    pub author_id: String,
    pub date: NaiveDate,
}

fn default_read_time() -> String {
    DEFAULT_READ_TIME.to_string()
}

/// Post entity - a blog article as seen by readers of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub read_time: String,
    pub author: String,
    pub author_id: String,
    pub date: NaiveDate,
}

impl Post {
    /// Attach a remote key to a decoded record.
    pub fn from_record(id: PostId, record: PostRecord) -> Self {
        Self {
            id,
            title: record.title,
            content: record.content,
            excerpt: record.excerpt,
            category: record.category,
            tags: record.tags,
            image: record.image,
            read_time: record.read_time,
            author: record.author,
            author_id: record.author_id,
            date: record.date,
        }
    }

    /// The record written to the remote store for this post.
    pub fn to_record(&self) -> PostRecord {
        PostRecord {
            title: self.title.clone(),
            content: self.content.clone(),
            excerpt: self.excerpt.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            image: self.image.clone(),
            read_time: self.read_time.clone(),
            author: self.author.clone(),
            author_id: self.author_id.clone(),
            date: self.date,
        }
    }

    /// Image URL to display, falling back to the placeholder.
    pub fn image_url(&self) -> &str {
        match self.image.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }

    /// Copy of this post with the draft's editable fields applied.
    ///
    /// Id, author, author id and creation date are carried over unchanged.
    pub fn with_edits(&self, draft: PostDraft) -> Self {
        let (image, read_time) = draft.resolved_media();
        Self {
            id: self.id.clone(),
            title: draft.title,
            content: draft.content,
            excerpt: draft.excerpt,
            category: draft.category,
            tags: clean_tags(draft.tags),
            image: Some(image),
            read_time,
            author: self.author.clone(),
            author_id: self.author_id.clone(),
            date: self.date,
        }
    }
}

/// The user-editable part of a post, as submitted by a create or edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
}

impl PostDraft {
    /// Split a comma-separated tag field, trimming entries and dropping empty ones.
    pub fn parse_tags(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect()
    }

    /// Editable fields of an existing post, for pre-filling an edit form.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            category: post.category.clone(),
            tags: post.tags.clone(),
            image: post.image.clone(),
            read_time: Some(post.read_time.clone()),
        }
    }

    /// Check the required fields and the category against `categories`.
    pub fn validate(&self, categories: &CategoryList) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        if self.content.trim().is_empty() {
            errors.push("content", "Content is required");
        }
        if self.excerpt.trim().is_empty() {
            errors.push("excerpt", "Excerpt is required");
        }
        if self.category.is_empty() {
            errors.push("category", "Category is required");
        } else if !categories.contains(&self.category) {
            errors.push("category", "Unknown category");
        }
        if !self.tags.iter().any(|tag| !tag.trim().is_empty()) {
            errors.push("tags", "At least one tag is required");
        }

        errors.into_result()
    }

    /// Build the record for a new post authored by `author` on `date`.
    pub fn into_record(self, author: &Identity, date: NaiveDate) -> PostRecord {
        let (image, read_time) = self.resolved_media();
        PostRecord {
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            category: self.category,
            tags: clean_tags(self.tags),
            image: Some(image),
            read_time,
            author: author.author_name().to_string(),
            author_id: author.user_id.clone(),
            date,
        }
    }

    fn resolved_media(&self) -> (String, String) {
        let image = self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
            .to_string();
        let read_time = self
            .read_time
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(DEFAULT_READ_TIME)
            .to_string();
        (image, read_time)
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PostDraft {
        PostDraft {
            title: "React Hooks".to_string(),
            content: "useState and friends".to_string(),
            excerpt: "intro".to_string(),
            category: "React".to_string(),
            tags: vec!["react".to_string(), " hooks ".to_string()],
            image: None,
            read_time: None,
        }
    }

    fn author() -> Identity {
        Identity::new("uid-1")
            .with_display_name("Amy")
            .with_email("amy@example.com")
    }

    #[test]
    fn test_parse_tags_trims_and_drops_empty() {
        assert_eq!(
            PostDraft::parse_tags(" react, ,hooks ,, state"),
            vec!["react", "hooks", "state"]
        );
        assert!(PostDraft::parse_tags(" , ").is_empty());
    }

    #[test]
    fn test_validate_accepts_complete_draft() {
        assert!(draft().validate(&CategoryList::default()).is_ok());
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let empty = PostDraft {
            title: "  ".to_string(),
            tags: vec![" ".to_string()],
            ..PostDraft::default()
        };

        let err = empty.validate(&CategoryList::default()).unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };

        assert_eq!(errors.len(), 5);
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("content"), Some("Content is required"));
        assert_eq!(errors.get("excerpt"), Some("Excerpt is required"));
        assert_eq!(errors.get("category"), Some("Category is required"));
        assert_eq!(errors.get("tags"), Some("At least one tag is required"));
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let mut d = draft();
        d.category = "react".to_string();

        let err = d.validate(&CategoryList::default()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref e) if e.get("category") == Some("Unknown category")));
    }

    #[test]
    fn test_into_record_sets_author_date_and_defaults() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let record = draft().into_record(&author(), date);

        assert_eq!(record.author, "Amy");
        assert_eq!(record.author_id, "uid-1");
        assert_eq!(record.date, date);
        assert_eq!(record.tags, vec!["react", "hooks"]);
        assert_eq!(record.image.as_deref(), Some(PLACEHOLDER_IMAGE));
        assert_eq!(record.read_time, DEFAULT_READ_TIME);
    }

    #[test]
    fn test_with_edits_preserves_identity_author_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let post = Post::from_record(PostId::new("-Nabc"), draft().into_record(&author(), date));

        let mut edit = PostDraft::from_post(&post);
        edit.title = "Hooks in depth".to_string();
        edit.category = "Tutorial".to_string();
        let edited = post.with_edits(edit);

        assert_eq!(edited.id, post.id);
        assert_eq!(edited.author, "Amy");
        assert_eq!(edited.author_id, "uid-1");
        assert_eq!(edited.date, date);
        assert_eq!(edited.title, "Hooks in depth");
        assert_eq!(edited.category, "Tutorial");
    }

    #[test]
    fn test_record_wire_shape_is_camel_case_without_id() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let value = serde_json::to_value(draft().into_record(&author(), date)).unwrap();

        assert_eq!(value["readTime"], "5 min read");
        assert_eq!(value["authorId"], "uid-1");
        assert_eq!(value["date"], "2024-03-01");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_record_decodes_without_optional_fields() {
        let value = serde_json::json!({
            "title": "t", "content": "c", "excerpt": "e", "category": "CSS",
            "author": "Bo", "authorId": "u2", "date": "2023-12-31"
        });
        let record: PostRecord = serde_json::from_value(value).unwrap();
        let post = Post::from_record(PostId::new("k"), record);

        assert!(post.tags.is_empty());
        assert_eq!(post.read_time, DEFAULT_READ_TIME);
        assert_eq!(post.image_url(), PLACEHOLDER_IMAGE);
    }
}
