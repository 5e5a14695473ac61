//! # Users
//!
//! Registration and account administration over the users mapping.
//! Users are never hard-deleted; bans and tiers are admin-only.

use chrono::Utc;
use domains::{next_record_id, Actor, DomainError, NewUser, ProfileUpdate, Result, Tier, User, UserTable};
use tracing::info;

use crate::{normalize_email, FeedService};

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn require_admin(actor: &Actor, action: &str) -> Result<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!("{action} requires an admin")))
    }
}

impl FeedService {
    pub async fn register_user(&self, new_user: NewUser) -> Result<User> {
        let email = normalize_email(&new_user.email);
        if !valid_email(&email) {
            return Err(DomainError::InvalidContent(format!("invalid email {email:?}")));
        }
        let name = new_user.name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidContent("name required".into()));
        }

        let _guard = self.write_guard().await;

        let mut users = self.store.load_users().await?;
        if users.contains_key(&email) {
            return Err(DomainError::Conflict(format!("{email} is already registered")));
        }

        let now = Utc::now();
        let user = User {
            id: next_record_id(now, users.values().map(|u| u.id).max())?,
            email: email.clone(),
            name: name.to_string(),
            password_hash: new_user.password_hash,
            verified: false,
            tier: Tier::None,
            banned: false,
            created_at: now,
            avatar: None,
        };
        users.insert(email, user.clone());
        self.store.save_users(&users).await?;

        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, email: &str) -> Result<User> {
        let email = normalize_email(email);
        self.store
            .load_users()
            .await?
            .remove(&email)
            .ok_or_else(|| DomainError::user_not_found(&email))
    }

    pub async fn verify_user(&self, email: &str) -> Result<User> {
        self.update_user(email, |user| {
            user.verified = true;
            Ok(())
        })
        .await
    }

    pub async fn set_tier(&self, actor: &Actor, email: &str, tier: Tier) -> Result<User> {
        require_admin(actor, "changing tiers")?;
        let user = self
            .update_user(email, |user| {
                user.tier = tier;
                Ok(())
            })
            .await?;
        info!(user_id = user.id, ?tier, by = actor.user_id, "tier changed");
        Ok(user)
    }

    /// Flips the ban flag; returns the user with the new state.
    pub async fn toggle_ban(&self, actor: &Actor, email: &str) -> Result<User> {
        require_admin(actor, "banning")?;
        let user = self
            .update_user(email, |user| {
                user.banned = !user.banned;
                Ok(())
            })
            .await?;
        info!(user_id = user.id, banned = user.banned, by = actor.user_id, "ban toggled");
        Ok(user)
    }

    /// Updates the acting user's own display name and avatar.
    pub async fn update_profile(&self, actor: &Actor, update: ProfileUpdate) -> Result<User> {
        self.update_user(&actor.email, |user| {
            if let Some(name) = &update.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(DomainError::InvalidContent("name required".into()));
                }
                user.name = name.to_string();
            }
            if let Some(avatar) = &update.avatar {
                user.avatar = (!avatar.trim().is_empty()).then(|| avatar.trim().to_string());
            }
            Ok(())
        })
        .await
    }

    async fn update_user<F>(&self, email: &str, apply: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> Result<()>,
    {
        let email = normalize_email(email);
        let _guard = self.write_guard().await;

        let mut users: UserTable = self.store.load_users().await?;
        let user = users
            .get_mut(&email)
            .ok_or_else(|| DomainError::user_not_found(&email))?;
        apply(user)?;
        let updated = user.clone();

        self.store.save_users(&users).await?;
        Ok(updated)
    }
}
