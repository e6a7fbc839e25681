use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::{new_id, Storage};
use crate::db::models::{
    BlogPost, BlogPostPatch, BrewingReading, NewBlogPost, NewBrewingReading, NewStats, Stats, User,
};

const USER_COLUMNS: &str = "id, username, password_hash, email, first_name, last_name, \
                            profile_image_url, created_at, updated_at";

const READING_COLUMNS: &str = "id, kettle_temperature, malt_temperature, mode, power, time_gmt, \
                               fermenter_beer_type, fermenter_temperature, fermenter_gravity, \
                               fermenter_total, fermenter_time_remaining, fermenter_progress, \
                               updated_at";

const POST_COLUMNS: &str =
    "id, title, summary, content, image_url, published, created_at, updated_at";

const STATS_COLUMNS: &str = "id, total_batches, liters_produced, active_fermenters, \
                             days_since_last_batch, updated_at";

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to load user by id")
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load user by username")
    }

    async fn upsert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO UPDATE
                SET password_hash = EXCLUDED.password_hash,
                    updated_at    = now()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .context("failed to upsert user")
    }

    async fn brewing_reading(&self) -> Result<Option<BrewingReading>> {
        sqlx::query_as::<_, BrewingReading>(&format!(
            "SELECT {READING_COLUMNS} FROM brewing_data ORDER BY updated_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .context("failed to load brewing reading")
    }

    async fn upsert_brewing_reading(&self, reading: NewBrewingReading) -> Result<BrewingReading> {
        let id = match self.brewing_reading().await? {
            Some(existing) => existing.id,
            None => new_id(),
        };
        let row = reading.into_reading(id, Utc::now());

        sqlx::query_as::<_, BrewingReading>(&format!(
            r#"
            INSERT INTO brewing_data ({READING_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                kettle_temperature       = EXCLUDED.kettle_temperature,
                malt_temperature         = EXCLUDED.malt_temperature,
                mode                     = EXCLUDED.mode,
                power                    = EXCLUDED.power,
                time_gmt                 = EXCLUDED.time_gmt,
                fermenter_beer_type      = EXCLUDED.fermenter_beer_type,
                fermenter_temperature    = EXCLUDED.fermenter_temperature,
                fermenter_gravity        = EXCLUDED.fermenter_gravity,
                fermenter_total          = EXCLUDED.fermenter_total,
                fermenter_time_remaining = EXCLUDED.fermenter_time_remaining,
                fermenter_progress       = EXCLUDED.fermenter_progress,
                updated_at               = EXCLUDED.updated_at
            RETURNING {READING_COLUMNS}
            "#
        ))
        .bind(&row.id)
        .bind(row.kettle_temperature)
        .bind(row.malt_temperature)
        .bind(&row.mode)
        .bind(row.power)
        .bind(&row.time_gmt)
        .bind(&row.fermenter_beer_type)
        .bind(row.fermenter_temperature)
        .bind(row.fermenter_gravity)
        .bind(&row.fermenter_total)
        .bind(&row.fermenter_time_remaining)
        .bind(row.fermenter_progress)
        .bind(row.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to upsert brewing reading")
    }

    async fn all_blog_posts(&self) -> Result<Vec<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list blog posts")
    }

    async fn published_blog_posts(&self) -> Result<Vec<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE published ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list published blog posts")
    }

    async fn blog_post(&self, id: &str) -> Result<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load blog post")
    }

    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            INSERT INTO blog_posts (id, title, summary, content, image_url, published)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(post.title)
        .bind(post.summary)
        .bind(post.content)
        .bind(post.image_url)
        .bind(post.published)
        .fetch_one(&self.pool)
        .await
        .context("failed to create blog post")
    }

    async fn update_blog_post(&self, id: &str, patch: BlogPostPatch) -> Result<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            UPDATE blog_posts SET
                title      = COALESCE($2, title),
                summary    = COALESCE($3, summary),
                content    = COALESCE($4, content),
                image_url  = COALESCE($5, image_url),
                published  = COALESCE($6, published),
                updated_at = now()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.summary)
        .bind(patch.content)
        .bind(patch.image_url)
        .bind(patch.published)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update blog post")
    }

    async fn delete_blog_post(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete blog post")?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<Option<Stats>> {
        sqlx::query_as::<_, Stats>(&format!(
            "SELECT {STATS_COLUMNS} FROM stats ORDER BY updated_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .context("failed to load stats")
    }

    async fn upsert_stats(&self, stats: NewStats) -> Result<Stats> {
        let id = match self.stats().await? {
            Some(existing) => existing.id,
            None => new_id(),
        };
        let row = stats.into_stats(id, Utc::now());

        sqlx::query_as::<_, Stats>(&format!(
            r#"
            INSERT INTO stats ({STATS_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                total_batches         = EXCLUDED.total_batches,
                liters_produced       = EXCLUDED.liters_produced,
                active_fermenters     = EXCLUDED.active_fermenters,
                days_since_last_batch = EXCLUDED.days_since_last_batch,
                updated_at            = EXCLUDED.updated_at
            RETURNING {STATS_COLUMNS}
            "#
        ))
        .bind(&row.id)
        .bind(row.total_batches)
        .bind(row.liters_produced)
        .bind(row.active_fermenters)
        .bind(row.days_since_last_batch)
        .bind(row.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to upsert stats")
    }
}

// ---------------------------------------------------------------------------
// Tests (need a Postgres reachable through DATABASE_URL)
// ---------------------------------------------------------------------------
