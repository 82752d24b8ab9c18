//! Post handlers: list, detail, authoring and comments.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use quill_core::domain::{CONTENT_AUTHOR_GRANT, Category, Comment, POSTS_PER_PAGE, Post, slug};
use quill_shared::dto::{
    CategorySummary, CommentPayload, CommentView, PostDetailResponse, PostListResponse,
    PostPayload, PostView,
};

use crate::handlers::{PageQuery, post_summary, sidebar};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn post_view(post: Post, author: String, categories: Vec<Category>) -> PostView {
    PostView {
        id: post.id.to_string(),
        title: post.title,
        slug: post.slug,
        content: post.content,
        author,
        categories: categories
            .into_iter()
            .map(|c| CategorySummary {
                slug: c.slug,
                title: c.title,
            })
            .collect(),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

/// Check the submitted title and content, collecting every failure.
///
/// `derive_slug` is set on create, where the title must also produce a
/// non-empty slug; updates keep the slug the post already has.
fn validate_payload(title: &str, content: &str, derive_slug: bool, errors: &mut Vec<String>) {
    if title.is_empty() {
        errors.push("Title must not be empty".to_string());
    } else if title.chars().count() > 200 {
        errors.push("Title must be at most 200 characters".to_string());
    } else if derive_slug && slug::slugify(title).is_empty() {
        errors.push("Title must contain at least one letter or number".to_string());
    }
    if content.is_empty() {
        errors.push("Content must not be empty".to_string());
    }
}

/// Resolve submitted category slugs, reporting each unknown one.
async fn resolve_categories(
    state: &AppState,
    slugs: &[String],
    errors: &mut Vec<String>,
) -> AppResult<Vec<Category>> {
    let mut wanted = slugs.to_vec();
    wanted.sort();
    wanted.dedup();

    let mut found = state.categories.find_by_slugs(&wanted).await?;
    for slug in &wanted {
        if !found.iter().any(|c| &c.slug == slug) {
            errors.push(format!("Unknown category '{slug}'"));
        }
    }
    found.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(found)
}

/// First candidate slug no existing post holds.
async fn free_slug(state: &AppState, base: &str) -> AppResult<String> {
    let mut chosen = base.to_string();
    for candidate in slug::candidates(base) {
        if state.posts.find_by_slug(&candidate).await?.is_none() {
            chosen = candidate;
            break;
        }
    }
    Ok(chosen)
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::NotFound("Invalid page".to_string()));
    }

    let result = state.posts.page_all(page, POSTS_PER_PAGE).await?;
    if result.is_out_of_range() {
        return Err(AppError::NotFound("Page out of range".to_string()));
    }

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: result.items.into_iter().map(post_summary).collect(),
        page: result.page,
        per_page: result.per_page,
        total_items: result.total_items,
        total_pages: result.total_pages,
        sidebar: sidebar(&state).await?,
    }))
}

/// GET /api/posts/{slug}
pub async fn detail(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let row = state
        .posts
        .find_by_slug_with_author(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let comments = state.comments.list_for_post(row.post.id).await?;
    let categories = state.posts.categories_of(row.post.id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: post_view(row.post, row.author.username, categories),
        comments: comments
            .into_iter()
            .map(|row| CommentView {
                id: row.comment.id.to_string(),
                author: row.author.username,
                body: row.comment.body,
                created_at: row.comment.created_at.to_rfc3339(),
            })
            .collect(),
        sidebar: sidebar(&state).await?,
    }))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    if !identity.has_permission(CONTENT_AUTHOR_GRANT) {
        return Err(AppError::Forbidden);
    }

    let req = body.into_inner();
    let title = req.title.trim();
    let content = req.content.trim();

    let mut errors = Vec::new();
    validate_payload(title, content, true, &mut errors);
    let categories = resolve_categories(&state, &req.categories, &mut errors).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let slug = free_slug(&state, &slug::slugify(title)).await?;
    let post = Post::new(
        identity.user_id,
        title.to_string(),
        slug,
        content.to_string(),
    );

    let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let saved = state.posts.insert_with_categories(post, &ids).await?;

    tracing::info!(post_id = %saved.id, slug = %saved.slug, "Post created");

    Ok(HttpResponse::Created().json(post_view(saved, identity.username, categories)))
}

/// PUT /api/posts/{slug}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let mut post = state
        .posts
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    if post.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    let req = body.into_inner();
    let title = req.title.trim();
    let content = req.content.trim();

    let mut errors = Vec::new();
    validate_payload(title, content, false, &mut errors);
    let categories = resolve_categories(&state, &req.categories, &mut errors).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // The slug stays what it was at creation, whatever the new title.
    post.title = title.to_string();
    post.content = content.to_string();
    post.updated_at = Utc::now();

    let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let saved = state.posts.update_with_categories(post, &ids).await?;

    tracing::info!(post_id = %saved.id, slug = %saved.slug, "Post updated");

    Ok(HttpResponse::Ok().json(post_view(saved, identity.username, categories)))
}

/// DELETE /api/posts/{slug}
pub async fn remove(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let post = state
        .posts
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    if post.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    state.posts.delete(post.id).await?;

    tracing::info!(post_id = %post.id, slug = %post.slug, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{slug}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<CommentPayload>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let post = state
        .posts
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let text = body.into_inner().body.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(vec![
            "Comment body must not be empty".to_string(),
        ]));
    }

    let comment = Comment::new(post.id, identity.user_id, text);
    let saved = state.comments.insert(comment).await?;

    tracing::info!(post_id = %post.id, comment_id = %saved.id, "Comment added");

    Ok(HttpResponse::Created().json(CommentView {
        id: saved.id.to_string(),
        author: identity.username,
        body: saved.body,
        created_at: saved.created_at.to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use chrono::{Duration, Utc};
    use serde_json::json;

    use quill_core::domain::CONTENT_AUTHOR_GRANT;
    use quill_shared::ErrorResponse;
    use quill_shared::dto::{CommentView, PostDetailResponse, PostListResponse, PostView};

    use crate::testing::{Backend, test_app};

    #[actix_web::test]
    async fn list_pages_posts_newest_first() {
        let backend = Backend::new();
        let (author, _) = backend.seed_user("ada", "hunter2hunter2", &[]);
        let start = Utc::now() - Duration::hours(12);
        for i in 0..7 {
            backend.seed_post_at(
                &author,
                &format!("Post {i}"),
                "body",
                start + Duration::hours(i),
            );
        }
        let app = test_app!(backend);

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/api/posts").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PostListResponse = test::read_body_json(resp).await;
        assert_eq!(body.posts.len(), 6);
        assert_eq!(body.total_items, 7);
        assert_eq!(body.total_pages, 2);
        assert_eq!(body.posts[0].title, "Post 6");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/posts?page=2").to_request(),
        )
        .await;
        let body: PostListResponse = test::read_body_json(resp).await;
        assert_eq!(body.posts.len(), 1);
        assert_eq!(body.posts[0].title, "Post 0");
    }

    #[actix_web::test]
    async fn page_zero_and_past_the_end_are_not_found() {
        let backend = Backend::new();
        let (author, _) = backend.seed_user("ada", "hunter2hunter2", &[]);
        backend.seed_post(&author, "Only one", "body");
        let app = test_app!(backend);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/posts?page=0").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/posts?page=5").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn empty_store_still_serves_the_first_page() {
        let backend = Backend::new();
        let app = test_app!(backend);

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/api/posts").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PostListResponse = test::read_body_json(resp).await;
        assert!(body.posts.is_empty());
        assert_eq!(body.total_items, 0);
    }

    #[actix_web::test]
    async fn detail_includes_comments_and_categories() {
        let backend = Backend::new();
        let (author, _) = backend.seed_user("ada", "hunter2hunter2", &[]);
        let post = backend.seed_post(&author, "Hello World", "body");
        let category = backend.seed_category(&author, "Tech");
        backend.link(&post, &category);
        backend
            .store
            .comments
            .lock()
            .unwrap()
            .push(quill_core::domain::Comment::new(
                post.id,
                author.id,
                "First!".to_string(),
            ));
        let app = test_app!(backend);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/posts/hello-world")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PostDetailResponse = test::read_body_json(resp).await;
        assert_eq!(body.post.author, "ada");
        assert_eq!(body.post.categories[0].slug, "tech");
        assert_eq!(body.comments.len(), 1);
        assert_eq!(body.comments[0].body, "First!");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/posts/missing").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn create_requires_the_author_grant() {
        let backend = Backend::new();
        let (_, token) = backend.seed_user("ada", "hunter2hunter2", &[]);
        let app = test_app!(backend);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({"title": "Hello", "content": "body"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn create_derives_and_suffixes_the_slug() {
        let backend = Backend::new();
        let (_, token) = backend.seed_user("ada", "hunter2hunter2", &[CONTENT_AUTHOR_GRANT]);
        let app = test_app!(backend);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({"title": "Hello, World!", "content": "body"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: PostView = test::read_body_json(resp).await;
        assert_eq!(body.slug, "hello-world");

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({"title": "Hello World", "content": "other"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: PostView = test::read_body_json(resp).await;
        assert_eq!(body.slug, "hello-world-2");
    }

    #[actix_web::test]
    async fn create_reports_unknown_categories() {
        let backend = Backend::new();
        let (author, token) = backend.seed_user("ada", "hunter2hunter2", &[CONTENT_AUTHOR_GRANT]);
        backend.seed_category(&author, "Tech");
        let app = test_app!(backend);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({
                "title": "Hello",
                "content": "body",
                "categories": ["tech", "nope"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.errors.unwrap(), vec!["Unknown category 'nope'"]);
    }

    #[actix_web::test]
    async fn create_rejects_symbols_only_title() {
        let backend = Backend::new();
        let (_, token) = backend.seed_user("ada", "hunter2hunter2", &[CONTENT_AUTHOR_GRANT]);
        let app = test_app!(backend);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({"title": "!!! ???", "content": "body"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn update_and_delete_are_author_only() {
        let backend = Backend::new();
        let (author, author_token) =
            backend.seed_user("ada", "hunter2hunter2", &[CONTENT_AUTHOR_GRANT]);
        let (_, other_token) = backend.seed_user("brin", "hunter2hunter2", &[CONTENT_AUTHOR_GRANT]);
        let post = backend.seed_post(&author, "Hello World", "body");
        backend
            .store
            .comments
            .lock()
            .unwrap()
            .push(quill_core::domain::Comment::new(
                post.id,
                author.id,
                "First!".to_string(),
            ));
        let app = test_app!(backend);

        let payload = json!({"title": "Hello Again", "content": "edited"});

        let req = test::TestRequest::put()
            .uri("/api/posts/hello-world")
            .insert_header(("Authorization", format!("Bearer {other_token}")))
            .set_json(payload.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri("/api/posts/hello-world")
            .insert_header(("Authorization", format!("Bearer {other_token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri("/api/posts/hello-world")
            .insert_header(("Authorization", format!("Bearer {author_token}")))
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PostView = test::read_body_json(resp).await;
        assert_eq!(body.title, "Hello Again");
        // The slug survives the retitle.
        assert_eq!(body.slug, "hello-world");

        let req = test::TestRequest::delete()
            .uri("/api/posts/hello-world")
            .insert_header(("Authorization", format!("Bearer {author_token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(backend.store.posts.lock().unwrap().is_empty());
        // The comment thread goes with the post.
        assert!(backend.store.comments.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn comments_need_a_token_and_a_body() {
        let backend = Backend::new();
        let (author, token) = backend.seed_user("ada", "hunter2hunter2", &[]);
        backend.seed_post(&author, "Hello World", "body");
        let app = test_app!(backend);

        let req = test::TestRequest::post()
            .uri("/api/posts/hello-world/comments")
            .set_json(json!({"body": "First!"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/posts/hello-world/comments")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({"body": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri("/api/posts/hello-world/comments")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({"body": "First!"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: CommentView = test::read_body_json(resp).await;
        assert_eq!(body.author, "ada");
        assert_eq!(body.body, "First!");
    }
}
