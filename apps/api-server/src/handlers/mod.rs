//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod health;
mod posts;
mod search;

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use quill_core::domain::{PostWithAuthor, RECENT_FEED_SIZE};
use quill_shared::ErrorResponse;
use quill_shared::dto::{CategoryCountEntry, PostSummary, RecentPostEntry, Sidebar};

use crate::middleware::error::AppResult;
use crate::observability::RequestId;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/profile", web::get().to(auth::profile))
                    .route("/profile", web::put().to(auth::update_profile)),
            )
            // Content routes
            .route("/posts", web::get().to(posts::list))
            .route("/posts", web::post().to(posts::create))
            .route("/posts/{slug}", web::get().to(posts::detail))
            .route("/posts/{slug}", web::put().to(posts::update))
            .route("/posts/{slug}", web::delete().to(posts::remove))
            .route("/posts/{slug}/comments", web::post().to(posts::add_comment))
            .route("/categories", web::get().to(categories::list))
            .route("/categories", web::post().to(categories::create))
            .route("/categories/{slug}", web::put().to(categories::update))
            .route("/categories/{slug}", web::delete().to(categories::remove))
            .route(
                "/categories/{slug}/posts",
                web::get().to(categories::posts_in),
            )
            .route("/search", web::get().to(search::search)),
    )
    .default_service(web::route().to(not_found));
}

/// Page selector for paginated list views. Pages are 1-based.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

/// Responds 404 for any route outside the table above.
async fn not_found(request_id: RequestId) -> HttpResponse {
    HttpResponse::NotFound()
        .json(ErrorResponse::not_found("Route not found").with_request_id(request_id.as_str()))
}

/// Context block rendered on every content page: the three most recent
/// posts and the per-category post counts.
pub(crate) async fn sidebar(state: &AppState) -> AppResult<Sidebar> {
    let recent = state.posts.recent(RECENT_FEED_SIZE).await?;
    let counts = state.categories.counts().await?;

    Ok(Sidebar {
        most_recent: recent
            .into_iter()
            .map(|post| RecentPostEntry {
                title: post.title,
                slug: post.slug,
                created_at: post.created_at.to_rfc3339(),
            })
            .collect(),
        category_counts: counts
            .into_iter()
            .map(|count| CategoryCountEntry {
                slug: count.slug,
                title: count.title,
                post_count: count.post_count,
            })
            .collect(),
    })
}

/// Flatten a post-with-author row into the list/search representation.
pub(crate) fn post_summary(row: PostWithAuthor) -> PostSummary {
    PostSummary {
        id: row.post.id.to_string(),
        title: row.post.title,
        slug: row.post.slug,
        content: row.post.content,
        author: row.author.username,
        created_at: row.post.created_at.to_rfc3339(),
    }
}
