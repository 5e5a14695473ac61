//! # api-adapters
//!
//! The web routing layer for the community feed.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;

#[cfg(feature = "web-axum")]
pub use self::web::router;

#[cfg(feature = "web-axum")]
mod web {
    use std::sync::Arc;

    use axum::{
        routing::{delete, get, post, put},
        Router,
    };
    use services::FeedService;

    use crate::{handlers, middleware};

    /// Builds the feed API over a ready `FeedService`.
    ///
    /// # Developer Note
    /// The router carries no prefix so the binary can nest it wherever the
    /// front end expects (e.g., /api/).
    pub fn router(service: Arc<FeedService>) -> Router {
        Router::new()
            // Feed & posts
            .route("/posts", get(handlers::list_posts).post(handlers::create_post))
            .route("/posts/{id}", delete(handlers::delete_post))
            .route("/posts/{id}/like", post(handlers::like_post))
            .route(
                "/posts/{id}/comments",
                get(handlers::list_comments).post(handlers::add_comment),
            )
            // Comments
            .route("/comments/{id}", delete(handlers::delete_comment))
            .route("/comments/{id}/like", post(handlers::like_comment))
            // Users
            .route("/users", post(handlers::register))
            .route("/users/me", get(handlers::me).patch(handlers::update_me))
            // Admin
            .route("/admin/users/{email}/verify", post(handlers::verify_user))
            .route("/admin/users/{email}/ban", post(handlers::toggle_ban))
            .route("/admin/users/{email}/tier", put(handlers::set_tier))
            .route("/admin/counters", get(handlers::audit_counters))
            .route("/admin/counters/repair", post(handlers::repair_counters))
            .layer(middleware::trace_layer())
            .layer(middleware::cors_policy())
            .with_state(service)
    }
}
