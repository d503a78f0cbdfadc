//! Read-only helpers behind the listing, detail and category views.

use crate::domain::{Identity, Post};

/// Posts whose category equals `name`, ignoring case. Store order is kept.
pub fn posts_in_category<'a>(posts: &'a [Post], name: &str) -> Vec<&'a Post> {
    let wanted = name.to_lowercase();
    posts
        .iter()
        .filter(|post| post.category.to_lowercase() == wanted)
        .collect()
}

/// Up to `limit` other posts sharing `post`'s category.
pub fn related_posts<'a>(posts: &'a [Post], post: &Post, limit: usize) -> Vec<&'a Post> {
    posts
        .iter()
        .filter(|p| p.id != post.id && p.category == post.category)
        .take(limit)
        .collect()
}

/// A category name and how many posts carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Distinct categories used by `posts`, in order of first appearance.
pub fn category_counts(posts: &[Post]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for post in posts {
        match counts.iter_mut().find(|c| c.name == post.category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                name: post.category.clone(),
                count: 1,
            }),
        }
    }
    counts
}

/// The post shown as featured: the first one in store order.
pub fn featured_post(posts: &[Post]) -> Option<&Post> {
    posts.first()
}

/// Whether edit and delete controls should be offered to `identity`.
///
/// Display only. The remote store enforces the real access rules.
pub fn can_edit(identity: Option<&Identity>, post: &Post) -> bool {
    identity.is_some_and(|id| id.user_id == post.author_id)
}
