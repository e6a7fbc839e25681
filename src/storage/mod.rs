//! Persistence seam shared by the HTTP layer and the brewing service.
//!
//! `PgStorage` talks to Postgres; `MemStorage` keeps everything in process and
//! is what local development and the HTTP tests run against.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::db::models::{
    BlogPost, BlogPostPatch, BrewingReading, NewBlogPost, NewBrewingReading, NewStats, Stats, User,
};

pub use memory::MemStorage;
pub use postgres::PgStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Insert the user, or replace the password hash of an existing username.
    async fn upsert_user(&self, username: &str, password_hash: &str) -> Result<User>;

    /// The current reading, if one has ever been stored.
    async fn brewing_reading(&self) -> Result<Option<BrewingReading>>;
    async fn upsert_brewing_reading(&self, reading: NewBrewingReading) -> Result<BrewingReading>;

    /// All posts, newest `created_at` first.
    async fn all_blog_posts(&self) -> Result<Vec<BlogPost>>;
    /// Posts with `published = true`, newest `created_at` first.
    async fn published_blog_posts(&self) -> Result<Vec<BlogPost>>;
    async fn blog_post(&self, id: &str) -> Result<Option<BlogPost>>;
    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost>;
    async fn update_blog_post(&self, id: &str, patch: BlogPostPatch) -> Result<Option<BlogPost>>;
    /// Permanently removes the post. Returns `false` if it did not exist.
    async fn delete_blog_post(&self, id: &str) -> Result<bool>;

    async fn stats(&self) -> Result<Option<Stats>>;
    async fn upsert_stats(&self, stats: NewStats) -> Result<Stats>;
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
