//! Search handler.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use quill_shared::dto::SearchResponse;

use crate::handlers::{post_summary, sidebar};
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/search
///
/// Case-insensitive substring match over titles and bodies. A blank query
/// returns every post; results are never paginated.
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let term = query.q.as_deref().map(str::trim).unwrap_or("");
    let results = state
        .posts
        .search((!term.is_empty()).then_some(term))
        .await?;

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: term.to_string(),
        results: results.into_iter().map(post_summary).collect(),
        sidebar: sidebar(&state).await?,
    }))
}
