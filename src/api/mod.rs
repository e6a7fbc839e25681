pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::{auth, blog, brewing, stats, ApiDoc};

use crate::{
    auth::{require_admin, TokenSigner},
    brewing::BrewingService,
    config::CookieSettings,
    rapt::clock::Clock,
    storage::Storage,
    writer::BlogWriter,
};

/// Everything a handler may need. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub brewing: BrewingService,
    pub writer: BlogWriter,
    pub signer: TokenSigner,
    pub cookies: CookieSettings,
    pub clock: Arc<dyn Clock>,
}

pub fn router(state: AppState) -> Router {
    let (public, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/brewing-data", get(brewing::current_reading))
        .route("/api/blog-posts", get(blog::list_published))
        .route("/api/blog-posts/{id}", get(blog::get_published))
        .route("/api/stats", get(stats::get_stats))
        .with_state(state.clone())
        .split_for_parts();

    let admin = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/brewing-data", put(brewing::update_reading))
        .route(
            "/api/admin/blog-posts",
            get(blog::list_all).post(blog::create),
        )
        .route(
            "/api/admin/blog-posts/{id}",
            get(blog::get_any).put(blog::update).delete(blog::delete),
        )
        .route("/api/admin/generate-blog-post", post(blog::generate))
        .route("/api/stats", put(stats::update_stats))
        .route_layer(middleware::from_fn_with_state(
            state.signer.clone(),
            require_admin,
        ))
        .with_state(state);

    // Credentials (the session cookie) cannot be combined with a wildcard
    // origin, so the request origin is echoed back instead.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, COOKIE]);

    public
        .merge(admin)
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Test harness shared by the handler tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::{sync::Arc, time::Duration};

    use axum_test::TestServer;
    use chrono::Utc;
    use serde_json::json;

    use super::{router, AppState};
    use crate::{
        auth::TokenSigner,
        brewing::BrewingService,
        config::{CookieSameSite, CookieSettings, RaptSettings, WriterSettings},
        rapt::{
            clock::{Clock, SystemClock},
            RaptClient,
        },
        storage::{MemStorage, Storage},
        writer::BlogWriter,
    };

    pub const SECRET: &str = "test-secret";
    pub const ADMIN: &str = "admin";
    pub const PASSWORD: &str = "hunter2";

    pub struct Harness {
        pub server: TestServer,
        pub storage: MemStorage,
        pub signer: TokenSigner,
    }

    /// Server over `storage` with RAPT and text generation unconfigured and an
    /// `admin` / `hunter2` account.
    pub async fn harness(storage: MemStorage) -> Harness {
        let hash = bcrypt::hash(PASSWORD, 4).unwrap();
        storage.upsert_user(ADMIN, &hash).await.unwrap();

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let rapt_settings = RaptSettings {
            username: None,
            api_secret: None,
            base_url: "http://127.0.0.1:9".to_owned(),
            auth_url: "http://127.0.0.1:9/connect/token".to_owned(),
            target_mac: None,
        };
        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        let signer = TokenSigner::new(SECRET);

        let state = AppState {
            storage: shared.clone(),
            brewing: BrewingService::new(
                shared,
                RaptClient::new(&rapt_settings, clock.clone()),
                rapt_settings,
                clock.clone(),
            ),
            writer: BlogWriter::new(WriterSettings {
                api_key: None,
                base_url: "http://127.0.0.1:9".to_owned(),
                model: "gpt-4o".to_owned(),
                timeout: Duration::from_secs(1),
            })
            .unwrap(),
            signer: signer.clone(),
            cookies: CookieSettings {
                secure: false,
                same_site: CookieSameSite::Strict,
            },
            clock,
        };

        let server = TestServer::builder()
            .save_cookies()
            .build(router(state))
            .unwrap();

        Harness {
            server,
            storage,
            signer,
        }
    }

    impl Harness {
        /// Log in through the API so the session cookie is stored on the
        /// test server.
        pub async fn login(&self) {
            self.server
                .post("/api/auth/login")
                .json(&json!({ "username": ADMIN, "password": PASSWORD }))
                .await
                .assert_status_ok();
        }

        /// A token valid for the admin account, for bearer-header requests.
        pub async fn bearer(&self) -> String {
            let user = self
                .storage
                .user_by_username(ADMIN)
                .await
                .unwrap()
                .unwrap();
            let token = self.signer.issue(&user.id, &user.username, Utc::now()).unwrap();
            format!("Bearer {token}")
        }
    }
}
