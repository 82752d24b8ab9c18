//! Category handlers: index, authoring and the per-category post list.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use quill_core::domain::{CONTENT_AUTHOR_GRANT, Category, POSTS_PER_PAGE, slug};
use quill_shared::dto::{
    CategoryListResponse, CategoryPayload, CategoryPostsResponse, CategorySummary,
};

use crate::handlers::{PageQuery, post_summary, sidebar};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn validate_title(title: &str, errors: &mut Vec<String>) {
    if title.is_empty() {
        errors.push("Title must not be empty".to_string());
    } else if title.chars().count() > 200 {
        errors.push("Title must be at most 200 characters".to_string());
    }
}

/// First candidate slug no existing category holds.
async fn free_slug(state: &AppState, base: &str) -> AppResult<String> {
    let mut chosen = base.to_string();
    for candidate in slug::candidates(base) {
        if state.categories.find_by_slug(&candidate).await?.is_none() {
            chosen = candidate;
            break;
        }
    }
    Ok(chosen)
}

/// GET /api/categories
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.categories.list_all().await?;

    Ok(HttpResponse::Ok().json(CategoryListResponse {
        categories: categories
            .into_iter()
            .map(|c| CategorySummary {
                slug: c.slug,
                title: c.title,
            })
            .collect(),
        sidebar: sidebar(&state).await?,
    }))
}

/// POST /api/categories
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CategoryPayload>,
) -> AppResult<HttpResponse> {
    if !identity.has_permission(CONTENT_AUTHOR_GRANT) {
        return Err(AppError::Forbidden);
    }

    let title = body.into_inner().title.trim().to_string();

    let mut errors = Vec::new();
    validate_title(&title, &mut errors);
    if errors.is_empty() && slug::slugify(&title).is_empty() {
        errors.push("Title must contain at least one letter or number".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let slug = free_slug(&state, &slug::slugify(&title)).await?;
    let category = Category::new(identity.user_id, title, slug);
    let saved = state.categories.insert(category).await?;

    tracing::info!(category_id = %saved.id, slug = %saved.slug, "Category created");

    Ok(HttpResponse::Created().json(CategorySummary {
        slug: saved.slug,
        title: saved.title,
    }))
}

/// PUT /api/categories/{slug}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<CategoryPayload>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let mut category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    if category.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    let title = body.into_inner().title.trim().to_string();

    let mut errors = Vec::new();
    validate_title(&title, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // As with posts, the slug never changes after creation.
    category.title = title;
    category.updated_at = Utc::now();
    let saved = state.categories.update(category).await?;

    tracing::info!(category_id = %saved.id, slug = %saved.slug, "Category updated");

    Ok(HttpResponse::Ok().json(CategorySummary {
        slug: saved.slug,
        title: saved.title,
    }))
}

/// DELETE /api/categories/{slug}
pub async fn remove(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    if category.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    // Posts stay; only the association rows go with the category.
    state.categories.delete(category.id).await?;

    tracing::info!(category_id = %category.id, slug = %category.slug, "Category deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/categories/{slug}/posts
pub async fn posts_in(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::NotFound("Invalid page".to_string()));
    }

    let result = state
        .posts
        .page_by_category(category.id, page, POSTS_PER_PAGE)
        .await?;
    if result.is_out_of_range() {
        return Err(AppError::NotFound("Page out of range".to_string()));
    }

    Ok(HttpResponse::Ok().json(CategoryPostsResponse {
        category: CategorySummary {
            slug: category.slug,
            title: category.title,
        },
        posts: result.items.into_iter().map(post_summary).collect(),
        page: result.page,
        per_page: result.per_page,
        total_items: result.total_items,
        total_pages: result.total_pages,
        sidebar: sidebar(&state).await?,
    }))
}
