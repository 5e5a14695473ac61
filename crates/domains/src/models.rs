//! # Domain Models
//!
//! These structs represent the core entities of the community feed.
//! Ids are time-derived `u64`s; owner references are always numeric user ids,
//! whichever backend persisted the record.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{DomainError, Result};

pub type UserId = u64;
pub type PostId = u64;
pub type CommentId = u64;

/// Users collection: a mapping keyed by email.
pub type UserTable = BTreeMap<String, User>;

/// Which physical storage is active for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    File,
    DocumentStore,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::File => f.write_str("file"),
            BackendMode::DocumentStore => f.write_str("document-store"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    None,
    Demo,
    Premium,
}

/// A registered member. Identity key is the email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// Opaque to this layer; produced and checked by the auth service.
    pub password_hash: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The fundamental unit of the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    /// Like records for this post, one per user.
    #[serde(default)]
    pub liked_by: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub liked_by: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

/// The Post or Comment a Like refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Subject {
    Post(PostId),
    Comment(CommentId),
}

/// Composite identity (subject, user). Existence is binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Like {
    pub subject: Subject,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeOutcome {
    Liked,
    Unliked,
}

/// Result of a toggle: what happened and the subject's new counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub outcome: LikeOutcome,
    pub likes_count: u64,
}

/// Shared like bookkeeping for posts and comments.
///
/// The like set and the counter move together: every toggle changes the
/// counter by exactly one in the direction of the set change.
pub trait Likeable {
    fn subject(&self) -> Subject;
    fn liked_by(&self) -> &BTreeSet<UserId>;
    fn likes_count(&self) -> u64;
    fn like_parts_mut(&mut self) -> (&mut BTreeSet<UserId>, &mut u64);

    fn is_liked_by(&self, user_id: UserId) -> bool {
        self.liked_by().contains(&user_id)
    }

    fn toggle_like(&mut self, user_id: UserId) -> LikeToggle {
        let (set, count) = self.like_parts_mut();
        let outcome = if set.remove(&user_id) {
            *count = count.saturating_sub(1);
            LikeOutcome::Unliked
        } else {
            set.insert(user_id);
            *count = count.saturating_add(1);
            LikeOutcome::Liked
        };
        LikeToggle {
            outcome,
            likes_count: *count,
        }
    }

    fn likes(&self) -> Vec<Like> {
        let subject = self.subject();
        self.liked_by()
            .iter()
            .map(|&user_id| Like { subject, user_id })
            .collect()
    }
}

impl Likeable for Post {
    fn subject(&self) -> Subject {
        Subject::Post(self.id)
    }

    fn liked_by(&self) -> &BTreeSet<UserId> {
        &self.liked_by
    }

    fn likes_count(&self) -> u64 {
        self.likes_count
    }

    fn like_parts_mut(&mut self) -> (&mut BTreeSet<UserId>, &mut u64) {
        (&mut self.liked_by, &mut self.likes_count)
    }
}

impl Likeable for Comment {
    fn subject(&self) -> Subject {
        Subject::Comment(self.id)
    }

    fn liked_by(&self) -> &BTreeSet<UserId> {
        &self.liked_by
    }

    fn likes_count(&self) -> u64 {
        self.likes_count
    }

    fn like_parts_mut(&mut self) -> (&mut BTreeSet<UserId>, &mut u64) {
        (&mut self.liked_by, &mut self.likes_count)
    }
}

/// Payload for a new post or comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

// Clients send `null` for "nothing here"; treat it like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Draft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// A draft needs trimmed text or at least one attachment.
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() && self.attachments.is_empty() {
            return Err(DomainError::InvalidContent(
                "content or attachments required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// The acting user, as resolved from the auth layer's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub email: String,
    pub banned: bool,
    pub is_admin: bool,
}

impl Actor {
    /// Authors and admins may remove a record.
    pub fn may_remove(&self, owner: UserId) -> bool {
        self.is_admin || self.user_id == owner
    }
}

// ── Read-side projection ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
    pub tier: Tier,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            tier: user.tier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedComment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub author: Option<AuthorSummary>,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub likes_count: u64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: PostId,
    pub user_id: UserId,
    pub author: Option<AuthorSummary>,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<FeedComment>,
}

/// Time-derived, strictly monotonic id: the current epoch millis, bumped past
/// the largest id already issued.
///
/// Fails when the stored ids have already reached `u64::MAX`; a wrapped id
/// would collide with existing records.
pub fn next_record_id(now: DateTime<Utc>, last: Option<u64>) -> Result<u64> {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    match last {
        Some(last) => last
            .checked_add(1)
            .map(|next| millis.max(next))
            .ok_or_else(|| DomainError::unavailable("issue record id", format!("id space exhausted after {last}"))),
        None => Ok(millis),
    }
}
