//! # Posts
//!
//! Creation and cascade delete. Deleting a post removes the post, then every
//! comment attached to it; likes live inside their subject, so they go with it.

use chrono::Utc;
use domains::{next_record_id, Actor, DomainError, Draft, Post, PostId, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::FeedService;

/// What a post delete took with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub comments_removed: usize,
    pub likes_removed: usize,
}

impl FeedService {
    pub async fn create_post(&self, actor: &Actor, draft: Draft) -> Result<Post> {
        draft.validate()?;
        if actor.banned {
            return Err(DomainError::Forbidden("banned users cannot post".into()));
        }

        let _guard = self.write_guard().await;

        let mut posts = self.store.load_posts().await?;
        let now = Utc::now();
        let post = Post {
            id: next_record_id(now, posts.iter().map(|p| p.id).max())?,
            user_id: actor.user_id,
            content: draft.content.trim().to_string(),
            attachments: draft.attachments,
            likes_count: 0,
            comments_count: 0,
            liked_by: Default::default(),
            created_at: now,
        };
        posts.push(post.clone());
        self.store.save_posts(&posts).await?;

        debug!(post_id = post.id, user_id = actor.user_id, "post created");
        Ok(post)
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<Post> {
        self.store
            .load_posts()
            .await?
            .into_iter()
            .find(|p| p.id == post_id)
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    /// Removes the post, then its comments, then every like on either.
    ///
    /// Only the author or an admin may delete. The two saves are not atomic:
    /// if the comment save fails the post is already gone and the error is
    /// returned; `repair_counters` drops the orphans afterwards.
    pub async fn delete_post(&self, actor: &Actor, post_id: PostId) -> Result<CascadeReport> {
        let _guard = self.write_guard().await;

        // 1. Remove the post
        let mut posts = self.store.load_posts().await?;
        let index = posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or_else(|| DomainError::post_not_found(post_id))?;
        if !actor.may_remove(posts[index].user_id) {
            return Err(DomainError::Forbidden(format!(
                "user {} may not delete post {post_id}",
                actor.user_id
            )));
        }
        let removed = posts.remove(index);
        self.store.save_posts(&posts).await?;

        let mut report = CascadeReport {
            comments_removed: 0,
            likes_removed: removed.liked_by.len(),
        };

        // 2. Remove dependent comments (and, with them, their likes)
        let mut comments = self.store.load_comments().await?;
        let before = comments.len();
        comments.retain(|c| {
            if c.post_id == post_id {
                report.likes_removed += c.liked_by.len();
                false
            } else {
                true
            }
        });
        report.comments_removed = before - comments.len();
        if report.comments_removed > 0 {
            self.store.save_comments(&comments).await?;
        }

        info!(
            post_id,
            by = actor.user_id,
            comments = report.comments_removed,
            likes = report.likes_removed,
            "post deleted"
        );
        Ok(report)
    }
}
