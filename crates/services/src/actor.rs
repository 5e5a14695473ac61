//! Acting-user resolution.

use domains::{Actor, DomainError, Result};

use crate::{normalize_email, FeedService};

impl FeedService {
    /// Builds the `Actor` for an email the auth layer already verified.
    pub async fn resolve_actor(&self, email: &str) -> Result<Actor> {
        let email = normalize_email(email);
        let users = self.store.load_users().await?;
        let user = users
            .get(&email)
            .ok_or_else(|| DomainError::Forbidden(format!("unknown user {email}")))?;

        Ok(Actor {
            user_id: user.id,
            email: user.email.clone(),
            banned: user.banned,
            is_admin: self.admin_emails.contains(&email),
        })
    }
}
