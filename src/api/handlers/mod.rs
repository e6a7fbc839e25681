pub mod auth;
pub mod blog;
pub mod brewing;
pub mod stats;

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use super::dto::{GenerateRequest, LoginRequest, MessageResponse, UserDto, UserResponse};
use crate::{
    db::models::{BlogPost, BlogPostPatch, BrewingReading, NewBlogPost, NewBrewingReading, NewStats, Stats},
    writer::Draft,
};

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI document
// ---------------------------------------------------------------------------

struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::login,
        auth::logout,
        auth::me,
        brewing::current_reading,
        brewing::update_reading,
        blog::list_published,
        blog::get_published,
        blog::list_all,
        blog::get_any,
        blog::create,
        blog::update,
        blog::delete,
        blog::generate,
        stats::get_stats,
        stats::update_stats,
    ),
    components(schemas(
        LoginRequest,
        UserDto,
        UserResponse,
        MessageResponse,
        GenerateRequest,
        Draft,
        BrewingReading,
        NewBrewingReading,
        BlogPost,
        NewBlogPost,
        BlogPostPatch,
        Stats,
        NewStats,
    )),
    modifiers(&SessionCookie),
    tags(
        (name = "auth", description = "Admin session endpoints"),
        (name = "brewing", description = "Live brewing dashboard"),
        (name = "blog", description = "Blog posts and draft generation"),
        (name = "stats", description = "Brewery statistics"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Brew Crew API",
        version = "0.1.0",
        description = "REST API for the brewing club dashboard, blog and admin tools"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::{api::testing::harness, storage::MemStorage};

    #[tokio::test]
    async fn health_is_ok() {
        let h = harness(MemStorage::new()).await;
        let resp = h.server.get("/health").await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let h = harness(MemStorage::new()).await;
        let doc: Value = h.server.get("/api-docs/openapi.json").await.json();
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/api/auth/login",
            "/api/brewing-data",
            "/api/admin/blog-posts/{id}",
            "/api/stats",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
