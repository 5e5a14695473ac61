//! Sample-data strategy for an empty feed.

use chrono::{DateTime, Duration, Utc};
use domains::{next_record_id, Post, Result};

/// Produces the posts written when the feed is first read while empty.
pub trait SampleSeeder: Send + Sync {
    fn sample_posts(&self, now: DateTime<Utc>) -> Result<Vec<Post>>;
}

/// Three canned welcome posts, owned by user id 0 (no registered author).
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedExamples;

const EXAMPLES: [&str; 3] = [
    "Welcome to the community! Introduce yourself in the comments.",
    "Tip: attach images or links to your posts. Text is optional when you do.",
    "Be kind. Posts and comments can be removed by their authors and by admins.",
];

impl SampleSeeder for CannedExamples {
    fn sample_posts(&self, now: DateTime<Utc>) -> Result<Vec<Post>> {
        let mut last = None;
        EXAMPLES
            .iter()
            .enumerate()
            .map(|(i, text)| {
                // Oldest first, an hour apart, so the feed shows them in order.
                let created_at = now - Duration::hours((EXAMPLES.len() - 1 - i) as i64);
                let id = next_record_id(created_at, last)?;
                last = Some(id);
                Ok(Post {
                    id,
                    user_id: 0,
                    content: (*text).to_string(),
                    attachments: Vec::new(),
                    likes_count: 0,
                    comments_count: 0,
                    liked_by: Default::default(),
                    created_at,
                })
            })
            .collect()
    }
}
