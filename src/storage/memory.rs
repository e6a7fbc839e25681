use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::RwLock;

use super::{new_id, Storage};
use crate::db::models::{
    BlogPost, BlogPostPatch, BrewingReading, NewBlogPost, NewBrewingReading, NewStats, Stats, User,
};

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    reading: Option<BrewingReading>,
    posts: HashMap<String, BlogPost>,
    stats: Option<Stats>,
}

/// In-process store. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemStorage {
    inner: Arc<RwLock<State>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo dashboard: one reading, one stats row and
    /// three published posts.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut state = State {
            reading: Some(BrewingReading {
                id: new_id(),
                kettle_temperature: 100.0,
                malt_temperature: 99.8,
                mode: "Boil".to_owned(),
                power: 5000,
                time_gmt: "09:45:12".to_owned(),
                fermenter_beer_type: "NEIPA".to_owned(),
                fermenter_temperature: 19.5,
                fermenter_gravity: 1.012,
                fermenter_total: "25L".to_owned(),
                fermenter_time_remaining: "3 dager 4 timer".to_owned(),
                fermenter_progress: 75,
                updated_at: now,
            }),
            stats: Some(Stats {
                id: new_id(),
                total_batches: 47,
                liters_produced: 1180,
                active_fermenters: 3,
                days_since_last_batch: 12,
                updated_at: now,
            }),
            ..State::default()
        };

        let samples = [
            (
                "Vårt Første NEIPA Brygg",
                "En dyptykk i vår første erfaring med å brygge en New England IPA. Lærdommer, utfordringer og triumfer.",
                "New England IPA har blitt en av våre favorittøl å brygge. I dette innlegget deler vi vår erfaring med å brygge vår første NEIPA, inkludert ingrediensene vi brukte, bryggeprosessen, og hva vi lærte underveis.",
                "https://images.unsplash.com/photo-1608270586620-248524c67de9?auto=format&fit=crop&w=800&h=400",
                (2024, 1, 15),
            ),
            (
                "Temperaturkontroll under gjæring",
                "Hvorfor er stabil temperatur så viktig? Vi deler våre beste tips for perfekt gjæring hver gang.",
                "Temperaturkontroll er kritisk for å oppnå konsistente resultater i hjemmebryggeriet. Her deler vi våre metoder for å holde stabil temperatur gjennom hele gjæringsprosessen.",
                "https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b?auto=format&fit=crop&w=800&h=400",
                (2024, 1, 10),
            ),
            (
                "RAPT.io: En Game Changer",
                "Hvordan sanntidsdata fra RAPT.io har forandret måten vi brygger på. En oversikt over verktøyet.",
                "RAPT.io har revolusjonert måten vi overvåker våre brygg på. Med sanntidsdata og fjernkontroll har vi oppnådd bedre konsistens og kvalitet i våre øl.",
                "https://images.unsplash.com/photo-1551288049-bebda4e38f71?auto=format&fit=crop&w=800&h=400",
                (2024, 1, 5),
            ),
        ];

        for (title, summary, content, image, (y, m, d)) in samples {
            let created = Utc
                .with_ymd_and_hms(y, m, d, 12, 0, 0)
                .single()
                .unwrap_or(now);
            let post = BlogPost {
                id: new_id(),
                title: title.to_owned(),
                summary: summary.to_owned(),
                content: content.to_owned(),
                image_url: Some(image.to_owned()),
                published: true,
                created_at: created,
                updated_at: created,
            };
            state.posts.insert(post.id.clone(), post);
        }

        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }
}

fn newest_first(mut posts: Vec<BlogPost>) -> Vec<BlogPost> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

#[async_trait]
impl Storage for MemStorage {
    async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn upsert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let mut state = self.inner.write().await;
        let now = Utc::now();

        if let Some(existing) = state.users.values_mut().find(|u| u.username == username) {
            existing.password_hash = password_hash.to_owned();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let user = User {
            id: new_id(),
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn brewing_reading(&self) -> Result<Option<BrewingReading>> {
        Ok(self.inner.read().await.reading.clone())
    }

    async fn upsert_brewing_reading(&self, reading: NewBrewingReading) -> Result<BrewingReading> {
        let mut state = self.inner.write().await;
        let id = state
            .reading
            .as_ref()
            .map(|r| r.id.clone())
            .unwrap_or_else(new_id);
        let stored = reading.into_reading(id, Utc::now());
        state.reading = Some(stored.clone());
        Ok(stored)
    }

    async fn all_blog_posts(&self) -> Result<Vec<BlogPost>> {
        let posts = self.inner.read().await.posts.values().cloned().collect();
        Ok(newest_first(posts))
    }

    async fn published_blog_posts(&self) -> Result<Vec<BlogPost>> {
        let posts = self
            .inner
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.published)
            .cloned()
            .collect();
        Ok(newest_first(posts))
    }

    async fn blog_post(&self, id: &str) -> Result<Option<BlogPost>> {
        Ok(self.inner.read().await.posts.get(id).cloned())
    }

    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost> {
        let now = Utc::now();
        let post = BlogPost {
            id: new_id(),
            title: post.title,
            summary: post.summary,
            content: post.content,
            image_url: post.image_url,
            published: post.published,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .posts
            .insert(post.id.clone(), post.clone());
        Ok(post)
    }

    async fn update_blog_post(&self, id: &str, patch: BlogPostPatch) -> Result<Option<BlogPost>> {
        let mut state = self.inner.write().await;
        Ok(state.posts.get_mut(id).map(|post| {
            patch.apply(post, Utc::now());
            post.clone()
        }))
    }

    async fn delete_blog_post(&self, id: &str) -> Result<bool> {
        Ok(self.inner.write().await.posts.remove(id).is_some())
    }

    async fn stats(&self) -> Result<Option<Stats>> {
        Ok(self.inner.read().await.stats.clone())
    }

    async fn upsert_stats(&self, stats: NewStats) -> Result<Stats> {
        let mut state = self.inner.write().await;
        let id = state
            .stats
            .as_ref()
            .map(|s| s.id.clone())
            .unwrap_or_else(new_id);
        let stored = stats.into_stats(id, Utc::now());
        state.stats = Some(stored.clone());
        Ok(stored)
    }
}

/// Insert a post with an explicit creation time. Test-only helper for
/// ordering assertions.
#[cfg(test)]
impl MemStorage {
    pub(crate) async fn insert_post_at(
        &self,
        title: &str,
        published: bool,
        created_at: chrono::DateTime<Utc>,
    ) -> BlogPost {
        let post = BlogPost {
            id: new_id(),
            title: title.to_owned(),
            summary: format!("{title} summary"),
            content: format!("{title} content"),
            image_url: None,
            published,
            created_at,
            updated_at: created_at,
        };
        self.inner
            .write()
            .await
            .posts
            .insert(post.id.clone(), post.clone());
        post
    }
}
