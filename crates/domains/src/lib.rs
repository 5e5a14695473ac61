//! community-feed/crates/domains/src/lib.rs
//!
//! The central record types and interface definitions for the community feed.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::errors::DomainError;
    use super::models::*;
    use chrono::{TimeZone, Utc};

    fn post(id: PostId) -> Post {
        Post {
            id,
            user_id: 7,
            content: "Hello Rust!".to_string(),
            attachments: Vec::new(),
            likes_count: 0,
            comments_count: 0,
            liked_by: Default::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn toggle_pairs_cancel_out() {
        let mut p = post(1);
        for round in 1..=5u64 {
            let toggle = p.toggle_like(9);
            let expected = if round % 2 == 1 {
                LikeOutcome::Liked
            } else {
                LikeOutcome::Unliked
            };
            assert_eq!(toggle.outcome, expected);
            assert_eq!(toggle.likes_count, round % 2);
            assert!(p.liked_by.len() <= 1);
        }
        assert!(p.is_liked_by(9));
    }

    #[test]
    fn toggles_from_different_users_accumulate() {
        let mut p = post(1);
        p.toggle_like(1);
        p.toggle_like(2);
        assert_eq!(p.likes_count, 2);
        assert_eq!(
            p.likes(),
            vec![
                Like { subject: Subject::Post(1), user_id: 1 },
                Like { subject: Subject::Post(1), user_id: 2 },
            ]
        );
    }

    #[test]
    fn draft_requires_text_or_attachment() {
        assert!(Draft::text("   \n").validate().is_err());
        assert!(Draft::text(" hi ").validate().is_ok());

        let with_file = Draft {
            content: String::new(),
            attachments: vec![Attachment {
                url: "/uploads/a.png".into(),
                mime: Some("image/png".into()),
                name: None,
            }],
        };
        assert!(with_file.validate().is_ok());
    }

    #[test]
    fn null_draft_fields_read_as_empty() {
        let draft: Draft = serde_json::from_str(r#"{"content":null,"attachments":null}"#).unwrap();
        assert_eq!(draft, Draft::default());
        assert!(matches!(draft.validate(), Err(DomainError::InvalidContent(_))));

        let draft: Draft = serde_json::from_str(r#"{"attachments":null,"content":"hi"}"#).unwrap();
        assert_eq!(draft.content, "hi");
        assert!(draft.attachments.is_empty());
    }

    #[test]
    fn record_ids_are_monotonic() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(next_record_id(now, None), Ok(1_700_000_000_000));
        assert_eq!(next_record_id(now, Some(1)), Ok(1_700_000_000_000));
        assert_eq!(
            next_record_id(now, Some(1_700_000_000_000)),
            Ok(1_700_000_000_001)
        );
    }

    #[test]
    fn exhausted_record_ids_fail_instead_of_wrapping() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let err = next_record_id(now, Some(u64::MAX)).unwrap_err();
        assert!(matches!(err, DomainError::StorageUnavailable(_)));
        assert_eq!(next_record_id(now, Some(u64::MAX - 1)), Ok(u64::MAX));
    }

    #[test]
    fn legacy_post_without_counters_deserializes() {
        let raw = r#"{"id":3,"user_id":1,"content":"old","created_at":"2024-01-01T00:00:00Z"}"#;
        let p: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(p.likes_count, 0);
        assert!(p.liked_by.is_empty());
        assert!(p.attachments.is_empty());
    }

    #[test]
    fn actor_may_remove_own_or_as_admin() {
        let actor = Actor { user_id: 4, email: "a@x.io".into(), banned: false, is_admin: false };
        assert!(actor.may_remove(4));
        assert!(!actor.may_remove(5));

        let admin = Actor { is_admin: true, ..actor };
        assert!(admin.may_remove(5));
    }
}
