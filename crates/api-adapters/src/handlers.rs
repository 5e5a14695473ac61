//! # Handlers
//!
//! This module coordinates the flow between HTTP requests and `FeedService`.
//! Every mutating route resolves the acting user first, then calls exactly one
//! service operation.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domains::{Actor, Comment, Draft, FeedPost, LikeOutcome, LikeToggle, NewUser, Post, ProfileUpdate, Tier, User};
use serde::{Deserialize, Serialize};
use services::{CascadeReport, CounterReport, FeedService};

use crate::error::ApiError;
use crate::extract::{ActingUser, ApiJson, Viewer};

pub type AppState = Arc<FeedService>;
type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<FeedPost>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub message: LikeOutcome,
    pub likes_count: u64,
}

impl From<LikeToggle> for LikeResponse {
    fn from(toggle: LikeToggle) -> Self {
        Self {
            message: toggle.outcome,
            likes_count: toggle.likes_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public view of a user; never carries the password credential.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub verified: bool,
    pub tier: Tier,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    pub avatar: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            verified: user.verified,
            tier: user.tier,
            banned: user.banned,
            created_at: user.created_at,
            avatar: user.avatar,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TierRequest {
    pub tier: Tier,
}

async fn actor(service: &FeedService, user: &ActingUser) -> ApiResult<Actor> {
    Ok(service.resolve_actor(&user.0).await?)
}

// ── Feed & posts ────────────────────────────────────────────────────────────

pub async fn list_posts(State(service): State<AppState>, Viewer(email): Viewer) -> ApiResult<Json<FeedResponse>> {
    // An unknown viewer reads the feed anonymously.
    let viewer = match email {
        Some(email) => match service.resolve_actor(&email).await {
            Ok(actor) => Some(actor.user_id),
            Err(domains::DomainError::Forbidden(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let posts = service.get_feed(viewer).await?;
    Ok(Json(FeedResponse { posts }))
}

pub async fn create_post(
    State(service): State<AppState>,
    user: ActingUser,
    ApiJson(draft): ApiJson<Draft>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let actor = actor(&service, &user).await?;
    let post = service.create_post(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn delete_post(
    State(service): State<AppState>,
    user: ActingUser,
    Path(post_id): Path<u64>,
) -> ApiResult<Json<CascadeReport>> {
    let actor = actor(&service, &user).await?;
    Ok(Json(service.delete_post(&actor, post_id).await?))
}

pub async fn like_post(
    State(service): State<AppState>,
    user: ActingUser,
    Path(post_id): Path<u64>,
) -> ApiResult<Json<LikeResponse>> {
    let actor = actor(&service, &user).await?;
    Ok(Json(service.toggle_post_like(&actor, post_id).await?.into()))
}

// ── Comments ────────────────────────────────────────────────────────────────

pub async fn list_comments(
    State(service): State<AppState>,
    Path(post_id): Path<u64>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(service.comments_for(post_id).await?))
}

pub async fn add_comment(
    State(service): State<AppState>,
    user: ActingUser,
    Path(post_id): Path<u64>,
    ApiJson(draft): ApiJson<Draft>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let actor = actor(&service, &user).await?;
    let comment = service.add_comment(&actor, post_id, draft).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(service): State<AppState>,
    user: ActingUser,
    Path(comment_id): Path<u64>,
) -> ApiResult<Json<MessageResponse>> {
    let actor = actor(&service, &user).await?;
    service.delete_comment(&actor, comment_id).await?;
    Ok(Json(MessageResponse {
        message: "deleted".into(),
    }))
}

pub async fn like_comment(
    State(service): State<AppState>,
    user: ActingUser,
    Path(comment_id): Path<u64>,
) -> ApiResult<Json<LikeResponse>> {
    let actor = actor(&service, &user).await?;
    Ok(Json(service.toggle_comment_like(&actor, comment_id).await?.into()))
}

// ── Users ───────────────────────────────────────────────────────────────────

/// Registration. The password credential arrives already hashed.
pub async fn register(
    State(service): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let user = service.register_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn me(State(service): State<AppState>, user: ActingUser) -> ApiResult<Json<UserView>> {
    Ok(Json(service.get_user(&user.0).await?.into()))
}

pub async fn update_me(
    State(service): State<AppState>,
    user: ActingUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<UserView>> {
    let actor = actor(&service, &user).await?;
    Ok(Json(service.update_profile(&actor, update).await?.into()))
}

// ── Admin ───────────────────────────────────────────────────────────────────

fn require_admin(actor: &Actor) -> ApiResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(domains::DomainError::Forbidden("admin only".into()).into())
    }
}

pub async fn verify_user(
    State(service): State<AppState>,
    user: ActingUser,
    Path(email): Path<String>,
) -> ApiResult<Json<UserView>> {
    require_admin(&actor(&service, &user).await?)?;
    Ok(Json(service.verify_user(&email).await?.into()))
}

pub async fn toggle_ban(
    State(service): State<AppState>,
    user: ActingUser,
    Path(email): Path<String>,
) -> ApiResult<Json<UserView>> {
    let actor = actor(&service, &user).await?;
    Ok(Json(service.toggle_ban(&actor, &email).await?.into()))
}

pub async fn set_tier(
    State(service): State<AppState>,
    user: ActingUser,
    Path(email): Path<String>,
    ApiJson(request): ApiJson<TierRequest>,
) -> ApiResult<Json<UserView>> {
    let actor = actor(&service, &user).await?;
    Ok(Json(service.set_tier(&actor, &email, request.tier).await?.into()))
}

pub async fn audit_counters(State(service): State<AppState>, user: ActingUser) -> ApiResult<Json<CounterReport>> {
    require_admin(&actor(&service, &user).await?)?;
    Ok(Json(service.audit_counters().await?))
}

pub async fn repair_counters(State(service): State<AppState>, user: ActingUser) -> ApiResult<Json<CounterReport>> {
    require_admin(&actor(&service, &user).await?)?;
    Ok(Json(service.repair_counters().await?))
}
