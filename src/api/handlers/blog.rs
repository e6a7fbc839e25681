use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use crate::{
    api::{
        dto::{GenerateRequest, MessageResponse},
        errors::AppError,
        AppState,
    },
    db::models::{BlogPost, BlogPostPatch, NewBlogPost},
    writer::Draft,
};

// ---------------------------------------------------------------------------
// Public
// ---------------------------------------------------------------------------

/// Published posts, newest first.
#[utoipa::path(
    get,
    path = "/api/blog-posts",
    responses(
        (status = 200, description = "Published posts", body = Vec<BlogPost>),
        (status = 500, description = "Internal server error", body = MessageResponse),
    ),
    tag = "blog"
)]
pub async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, AppError> {
    Ok(Json(state.storage.published_blog_posts().await?))
}

/// A single published post. Unpublished posts are indistinguishable from
/// missing ones.
#[utoipa::path(
    get,
    path = "/api/blog-posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = BlogPost),
        (status = 404, description = "No published post with this id", body = MessageResponse),
    ),
    tag = "blog"
)]
pub async fn get_published(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    state
        .storage
        .blog_post(&id)
        .await?
        .filter(|p| p.published)
        .map(Json)
        .ok_or(AppError::NotFound("Blog post"))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Every post regardless of publish state, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/blog-posts",
    responses(
        (status = 200, description = "All posts", body = Vec<BlogPost>),
        (status = 401, description = "Not logged in", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "blog"
)]
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, AppError> {
    Ok(Json(state.storage.all_blog_posts().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/blog-posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = BlogPost),
        (status = 401, description = "Not logged in", body = MessageResponse),
        (status = 404, description = "No post with this id", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "blog"
)]
pub async fn get_any(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    state
        .storage
        .blog_post(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Blog post"))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog-posts",
    request_body = NewBlogPost,
    responses(
        (status = 200, description = "Created post", body = BlogPost),
        (status = 400, description = "Invalid post", body = MessageResponse),
        (status = 401, description = "Not logged in", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "blog"
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewBlogPost>, JsonRejection>,
) -> Result<Json<BlogPost>, AppError> {
    let Json(input) = payload?;
    input.validate().map_err(AppError::Validation)?;

    let post = state.storage.create_blog_post(input).await?;
    info!(id = %post.id, published = post.published, "Blog post created");
    Ok(Json(post))
}

/// Partial update; fields left out of the body keep their stored values.
#[utoipa::path(
    put,
    path = "/api/admin/blog-posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    request_body = BlogPostPatch,
    responses(
        (status = 200, description = "Updated post", body = BlogPost),
        (status = 400, description = "Invalid update", body = MessageResponse),
        (status = 401, description = "Not logged in", body = MessageResponse),
        (status = 404, description = "No post with this id", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "blog"
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BlogPostPatch>, JsonRejection>,
) -> Result<Json<BlogPost>, AppError> {
    let Json(patch) = payload?;
    patch.validate().map_err(AppError::Validation)?;

    let post = state
        .storage
        .update_blog_post(&id, patch)
        .await?
        .ok_or(AppError::NotFound("Blog post"))?;
    info!(id = %post.id, "Blog post updated");
    Ok(Json(post))
}

#[utoipa::path(
    delete,
    path = "/api/admin/blog-posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 401, description = "Not logged in", body = MessageResponse),
        (status = 404, description = "No post with this id", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "blog"
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.storage.delete_blog_post(&id).await? {
        return Err(AppError::NotFound("Blog post"));
    }
    info!(id = %id, "Blog post deleted");
    Ok(Json(MessageResponse::new("Blog post deleted successfully")))
}

/// Draft a post for a topic. Nothing is stored.
#[utoipa::path(
    post,
    path = "/api/admin/generate-blog-post",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated or canned draft", body = Draft),
        (status = 400, description = "Topic missing", body = MessageResponse),
        (status = 401, description = "Not logged in", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "blog"
)]
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Draft>, AppError> {
    let Json(req) = payload?;
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("Topic is required".to_owned()));
    }

    let draft = state
        .writer
        .generate(topic, req.additional_context.as_deref())
        .await;
    Ok(Json(draft))
}
