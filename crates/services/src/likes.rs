//! # Like toggle
//!
//! Flips like state for a (subject, user) pair based on current existence.
//! The existence check and the mutation are two steps against a snapshot;
//! concurrent togglers can race on the counter but never create a second
//! like for the same pair, since the like set holds each user once.

use domains::{Actor, CommentId, DomainError, LikeToggle, Likeable, PostId, Result, Subject};
use tracing::debug;

use crate::FeedService;

/// Toggles the like on the record matching `subject`, if present.
fn toggle_in<T: Likeable>(records: &mut [T], subject: Subject, user_id: u64) -> Option<LikeToggle> {
    records
        .iter_mut()
        .find(|r| r.subject() == subject)
        .map(|r| r.toggle_like(user_id))
}

impl FeedService {
    pub async fn toggle_post_like(&self, actor: &Actor, post_id: PostId) -> Result<LikeToggle> {
        let _guard = self.write_guard().await;

        let mut posts = self.store.load_posts().await?;
        let toggle = toggle_in(&mut posts, Subject::Post(post_id), actor.user_id)
            .ok_or_else(|| DomainError::post_not_found(post_id))?;
        self.store.save_posts(&posts).await?;

        debug!(post_id, user_id = actor.user_id, outcome = ?toggle.outcome, likes = toggle.likes_count, "post like toggled");
        Ok(toggle)
    }

    pub async fn toggle_comment_like(&self, actor: &Actor, comment_id: CommentId) -> Result<LikeToggle> {
        let _guard = self.write_guard().await;

        let mut comments = self.store.load_comments().await?;
        let toggle = toggle_in(&mut comments, Subject::Comment(comment_id), actor.user_id)
            .ok_or_else(|| DomainError::comment_not_found(comment_id))?;
        self.store.save_comments(&comments).await?;

        debug!(comment_id, user_id = actor.user_id, outcome = ?toggle.outcome, likes = toggle.likes_count, "comment like toggled");
        Ok(toggle)
    }
}
