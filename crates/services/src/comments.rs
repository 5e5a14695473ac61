//! # Comments
//!
//! Adding a comment bumps its post's `comments_count`; removing one drops it.
//! Siblings are never touched.

use chrono::Utc;
use domains::{next_record_id, Actor, Comment, CommentId, DomainError, Draft, PostId, Result};
use tracing::{debug, warn};

use crate::FeedService;

impl FeedService {
    /// Inserts the comment, then bumps the parent's `comments_count`.
    ///
    /// The two saves are not atomic: if the post save fails the comment is
    /// already stored, the counter is one short and the error is returned.
    /// Retrying adds a second comment; `repair_counters` fixes the counter.
    pub async fn add_comment(&self, actor: &Actor, post_id: PostId, draft: Draft) -> Result<Comment> {
        draft.validate()?;
        if actor.banned {
            return Err(DomainError::Forbidden("banned users cannot comment".into()));
        }

        let _guard = self.write_guard().await;

        let mut posts = self.store.load_posts().await?;
        let parent = posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or_else(|| DomainError::post_not_found(post_id))?;

        // 1. Insert the comment
        let mut comments = self.store.load_comments().await?;
        let now = Utc::now();
        let comment = Comment {
            id: next_record_id(now, comments.iter().map(|c| c.id).max())?,
            post_id,
            user_id: actor.user_id,
            content: draft.content.trim().to_string(),
            attachments: draft.attachments,
            likes_count: 0,
            liked_by: Default::default(),
            created_at: now,
        };
        comments.push(comment.clone());
        self.store.save_comments(&comments).await?;

        // 2. Bump the parent's counter
        posts[parent].comments_count = posts[parent].comments_count.saturating_add(1);
        self.store.save_posts(&posts).await?;

        debug!(comment_id = comment.id, post_id, user_id = actor.user_id, "comment added");
        Ok(comment)
    }

    /// Comments on `post_id`, oldest first.
    pub async fn comments_for(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let posts = self.store.load_posts().await?;
        if !posts.iter().any(|p| p.id == post_id) {
            return Err(DomainError::post_not_found(post_id));
        }

        let mut comments: Vec<Comment> = self
            .store
            .load_comments()
            .await?
            .into_iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    pub async fn delete_comment(&self, actor: &Actor, comment_id: CommentId) -> Result<()> {
        let _guard = self.write_guard().await;

        let mut comments = self.store.load_comments().await?;
        let index = comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| DomainError::comment_not_found(comment_id))?;
        if !actor.may_remove(comments[index].user_id) {
            return Err(DomainError::Forbidden(format!(
                "user {} may not delete comment {comment_id}",
                actor.user_id
            )));
        }
        let removed = comments.remove(index);
        self.store.save_comments(&comments).await?;

        let mut posts = self.store.load_posts().await?;
        match posts.iter_mut().find(|p| p.id == removed.post_id) {
            Some(parent) => {
                parent.comments_count = parent.comments_count.saturating_sub(1);
                self.store.save_posts(&posts).await?;
            }
            None => warn!(comment_id, post_id = removed.post_id, "deleted comment had no parent post"),
        }

        debug!(comment_id, by = actor.user_id, "comment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use domains::RecordStore;

    use super::*;
    use crate::testing::{actor, service, user, ADMIN};

    #[tokio::test]
    async fn add_comment_bumps_parent_counter() {
        let (service, store) = service().await;
        let ann = actor(&user(1, "ann@feed.test"));
        let bob = actor(&user(2, "bob@feed.test"));

        let post = service.create_post(&ann, Draft::text("p")).await.unwrap();
        service.add_comment(&bob, post.id, Draft::text(" first ")).await.unwrap();
        service.add_comment(&ann, post.id, Draft::text("second")).await.unwrap();

        let posts = store.load_posts().await.unwrap();
        assert_eq!(posts[0].comments_count, 2);

        let comments = service.comments_for(post.id).await.unwrap();
        assert_eq!(comments[0].content, "first");
        assert_eq!(comments[1].content, "second");
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let (service, store) = service().await;
        let bob = actor(&user(2, "bob@feed.test"));

        let err = service.add_comment(&bob, 77, Draft::text("hey")).await.unwrap_err();
        assert_eq!(err, DomainError::post_not_found(77));
        assert!(store.load_comments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_comment_is_invalid_and_leaves_counter_alone() {
        let (service, store) = service().await;
        let ann = actor(&user(1, "ann@feed.test"));
        let post = service.create_post(&ann, Draft::text("p")).await.unwrap();

        let err = service.add_comment(&ann, post.id, Draft::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidContent(_)));
        assert_eq!(store.load_posts().await.unwrap()[0].comments_count, 0);
    }

    #[tokio::test]
    async fn banned_commenter_is_forbidden() {
        let (service, _) = service().await;
        let ann = actor(&user(1, "ann@feed.test"));
        let post = service.create_post(&ann, Draft::text("p")).await.unwrap();

        let mut bob = user(2, "bob@feed.test");
        bob.banned = true;
        let err = service
            .add_comment(&actor(&bob), post.id, Draft::text("spam"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn delete_comment_leaves_siblings() {
        let (service, store) = service().await;
        let ann = actor(&user(1, "ann@feed.test"));
        let bob = actor(&user(2, "bob@feed.test"));
        let admin = actor(&user(3, ADMIN));

        let post = service.create_post(&ann, Draft::text("p")).await.unwrap();
        let a = service.add_comment(&bob, post.id, Draft::text("a")).await.unwrap();
        let b = service.add_comment(&bob, post.id, Draft::text("b")).await.unwrap();
        service.toggle_comment_like(&ann, b.id).await.unwrap();

        let err = service.delete_comment(&ann, a.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        service.delete_comment(&admin, a.id).await.unwrap();

        let comments = store.load_comments().await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, b.id);
        assert_eq!(comments[0].likes_count, 1);
        assert_eq!(store.load_posts().await.unwrap()[0].comments_count, 1);
    }
}
