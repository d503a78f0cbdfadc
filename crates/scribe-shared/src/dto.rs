//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Tags as submitted by a form: either a list or one comma-separated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

/// Request to create a post. Author and date are never accepted from clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: TagsInput,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
}

/// Edits replace every editable field, so the body matches creation.
pub type UpdatePostRequest = CreatePostRequest;

/// A post as served to readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Resolved image URL, the placeholder when the post has none.
    pub image: String,
    pub read_time: String,
    pub author: String,
    pub author_id: String,
    pub date: NaiveDate,
}

/// Detail page payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub related: Vec<PostResponse>,
    /// Whether the caller authored the post. Display hint only.
    pub can_edit: bool,
}

/// Acknowledgement of a forwarded write.
///
/// The change shows up in reads once the next store snapshot arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationAccepted {
    pub id: String,
}

/// Query parameters of the post listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Query parameters of a search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub category: Option<String>,
    pub sort: String,
    pub total: usize,
    pub results: Vec<PostResponse>,
}

/// Replaces the shared search query and selected category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetQueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryStateResponse {
    pub query: String,
    pub category: Option<String>,
}

/// A category with the number of posts filed under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPostsResponse {
    pub name: String,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedMutationResponse {
    pub kind: String,
    pub post_id: Option<String>,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Synchronization state of the content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatusResponse {
    pub status: String,
    pub loading: bool,
    pub error: Option<String>,
    pub revision: u64,
    pub post_count: usize,
    pub in_flight: usize,
    pub failed_mutations: Vec<FailedMutationResponse>,
}
