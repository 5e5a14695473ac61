//! # Counter audit
//!
//! Recomputes every denormalized counter from the records it summarizes:
//! `comments_count` from attached comments, `likes_count` from the like set.
//! Comments whose post is gone are reported as orphans.

use std::collections::{HashMap, HashSet};

use domains::{Comment, CommentId, Likeable, Post, PostId, Result, Subject};
use serde::Serialize;
use tracing::{info, warn};

use crate::FeedService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterField {
    Likes,
    Comments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterDrift {
    pub subject: Subject,
    pub field: CounterField,
    pub stored: u64,
    pub actual: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CounterReport {
    pub drifts: Vec<CounterDrift>,
    pub orphan_comments: Vec<CommentId>,
}

impl CounterReport {
    pub fn is_consistent(&self) -> bool {
        self.drifts.is_empty() && self.orphan_comments.is_empty()
    }
}

fn like_drift<T: Likeable>(record: &T) -> Option<CounterDrift> {
    let actual = record.liked_by().len() as u64;
    (record.likes_count() != actual).then(|| CounterDrift {
        subject: record.subject(),
        field: CounterField::Likes,
        stored: record.likes_count(),
        actual,
    })
}

fn inspect(posts: &[Post], comments: &[Comment]) -> CounterReport {
    let post_ids: HashSet<PostId> = posts.iter().map(|p| p.id).collect();
    let mut attached: HashMap<PostId, u64> = HashMap::new();
    let mut report = CounterReport::default();

    for comment in comments {
        if post_ids.contains(&comment.post_id) {
            *attached.entry(comment.post_id).or_default() += 1;
            report.drifts.extend(like_drift(comment));
        } else {
            report.orphan_comments.push(comment.id);
        }
    }

    for post in posts {
        report.drifts.extend(like_drift(post));
        let actual = attached.get(&post.id).copied().unwrap_or(0);
        if post.comments_count != actual {
            report.drifts.push(CounterDrift {
                subject: Subject::Post(post.id),
                field: CounterField::Comments,
                stored: post.comments_count,
                actual,
            });
        }
    }

    report
}

impl FeedService {
    /// Read-only consistency check.
    pub async fn audit_counters(&self) -> Result<CounterReport> {
        let posts = self.store.load_posts().await?;
        let comments = self.store.load_comments().await?;
        let report = inspect(&posts, &comments);
        if !report.is_consistent() {
            warn!(
                drifts = report.drifts.len(),
                orphans = report.orphan_comments.len(),
                "counter drift detected"
            );
        }
        Ok(report)
    }

    /// Rewrites drifted counters and drops orphan comments. Returns what it
    /// found; only collections that changed are saved.
    pub async fn repair_counters(&self) -> Result<CounterReport> {
        let _guard = self.write_guard().await;

        let mut posts = self.store.load_posts().await?;
        let mut comments = self.store.load_comments().await?;
        let report = inspect(&posts, &comments);
        if report.is_consistent() {
            return Ok(report);
        }

        let orphans: HashSet<CommentId> = report.orphan_comments.iter().copied().collect();
        comments.retain(|c| !orphans.contains(&c.id));

        let fixes: HashMap<(Subject, CounterField), u64> = report
            .drifts
            .iter()
            .map(|d| ((d.subject, d.field), d.actual))
            .collect();

        let mut posts_changed = false;
        for post in &mut posts {
            if let Some(&n) = fixes.get(&(Subject::Post(post.id), CounterField::Likes)) {
                post.likes_count = n;
                posts_changed = true;
            }
            if let Some(&n) = fixes.get(&(Subject::Post(post.id), CounterField::Comments)) {
                post.comments_count = n;
                posts_changed = true;
            }
        }

        let mut comments_changed = !orphans.is_empty();
        for comment in &mut comments {
            if let Some(&n) = fixes.get(&(Subject::Comment(comment.id), CounterField::Likes)) {
                comment.likes_count = n;
                comments_changed = true;
            }
        }

        if comments_changed {
            self.store.save_comments(&comments).await?;
        }
        if posts_changed {
            self.store.save_posts(&posts).await?;
        }

        info!(
            drifts = report.drifts.len(),
            orphans = report.orphan_comments.len(),
            "counters repaired"
        );
        Ok(report)
    }
}
