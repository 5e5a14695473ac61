//! # Feed Assembler
//!
//! Joins posts with their comments, authors and the viewer's like state.
//! Read-only over counters: they are reported as stored.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use domains::{
    AuthorSummary, Comment, FeedComment, FeedPost, Likeable, Post, PostId, Result, UserId,
};
use tracing::info;

use crate::{FeedService, SampleSeeder};

fn project_comment(
    comment: Comment,
    authors: &HashMap<UserId, AuthorSummary>,
    viewer: Option<UserId>,
) -> FeedComment {
    FeedComment {
        is_liked: viewer.is_some_and(|v| comment.is_liked_by(v)),
        author: authors.get(&comment.user_id).cloned(),
        id: comment.id,
        post_id: comment.post_id,
        user_id: comment.user_id,
        content: comment.content,
        attachments: comment.attachments,
        likes_count: comment.likes_count,
        created_at: comment.created_at,
    }
}

fn project_post(
    post: Post,
    comments: Vec<FeedComment>,
    authors: &HashMap<UserId, AuthorSummary>,
    viewer: Option<UserId>,
) -> FeedPost {
    FeedPost {
        is_liked: viewer.is_some_and(|v| post.is_liked_by(v)),
        author: authors.get(&post.user_id).cloned(),
        id: post.id,
        user_id: post.user_id,
        content: post.content,
        attachments: post.attachments,
        likes_count: post.likes_count,
        comments_count: post.comments_count,
        created_at: post.created_at,
        comments,
    }
}

impl FeedService {
    /// All posts, newest first, each with its comments oldest first.
    pub async fn get_feed(&self, viewer: Option<UserId>) -> Result<Vec<FeedPost>> {
        let mut posts = self.store.load_posts().await?;
        if posts.is_empty() {
            if let Some(seeder) = &self.seeder {
                posts = self.seed_if_empty(seeder.clone()).await?;
            }
        }

        let comments = self.store.load_comments().await?;
        let users = self.store.load_users().await?;
        let authors: HashMap<UserId, AuthorSummary> =
            users.values().map(|u| (u.id, AuthorSummary::from(u))).collect();

        let mut by_post: HashMap<PostId, Vec<Comment>> = HashMap::new();
        for comment in comments {
            by_post.entry(comment.post_id).or_default().push(comment);
        }

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .map(|post| {
                let mut attached = by_post.remove(&post.id).unwrap_or_default();
                attached.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                let attached = attached
                    .into_iter()
                    .map(|c| project_comment(c, &authors, viewer))
                    .collect();
                project_post(post, attached, &authors, viewer)
            })
            .collect())
    }

    /// Re-checks emptiness under the write guard so seeding never overwrites.
    async fn seed_if_empty(&self, seeder: Arc<dyn SampleSeeder>) -> Result<Vec<Post>> {
        let _guard = self.write_guard().await;

        let current = self.store.load_posts().await?;
        if !current.is_empty() {
            return Ok(current);
        }

        let samples = seeder.sample_posts(Utc::now())?;
        self.store.save_posts(&samples).await?;
        info!(count = samples.len(), "seeded empty feed with sample posts");
        Ok(samples)
    }
}
