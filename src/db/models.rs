use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Brewing reading
// ---------------------------------------------------------------------------

/// Snapshot of kettle and fermenter telemetry. Only the current row matters.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrewingReading {
    pub id: String,
    /// Kettle temperature in °C.
    pub kettle_temperature: f64,
    /// Malt (mash) temperature in °C.
    pub malt_temperature: f64,
    /// Free text, e.g. `"Boil"`, `"Mashing"`.
    pub mode: String,
    /// Heater power in watts.
    pub power: i32,
    /// Wall-clock time of the reading, `HH:MM:SS` UTC.
    #[serde(rename = "timeGMT")]
    pub time_gmt: String,
    pub fermenter_beer_type: String,
    pub fermenter_temperature: f64,
    /// Specific gravity, e.g. 1.012.
    pub fermenter_gravity: f64,
    /// Batch volume, e.g. `"25L"`.
    pub fermenter_total: String,
    pub fermenter_time_remaining: String,
    /// Percentage in `[0, 100]`.
    pub fermenter_progress: i32,
    pub updated_at: DateTime<Utc>,
}

/// Admin-supplied body for `PUT /api/brewing-data`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBrewingReading {
    pub kettle_temperature: f64,
    pub malt_temperature: f64,
    pub mode: String,
    pub power: i32,
    #[serde(rename = "timeGMT")]
    pub time_gmt: String,
    pub fermenter_beer_type: String,
    pub fermenter_temperature: f64,
    pub fermenter_gravity: f64,
    pub fermenter_total: String,
    pub fermenter_time_remaining: String,
    pub fermenter_progress: i32,
}

impl NewBrewingReading {
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=100).contains(&self.fermenter_progress) {
            return Err(format!(
                "fermenterProgress must be within 0..=100, got {}",
                self.fermenter_progress
            ));
        }
        if self.power < 0 {
            return Err(format!("power must be non-negative, got {}", self.power));
        }
        Ok(())
    }

    /// Materialise the row that replaces the current reading.
    pub fn into_reading(self, id: String, updated_at: DateTime<Utc>) -> BrewingReading {
        BrewingReading {
            id,
            kettle_temperature: self.kettle_temperature,
            malt_temperature: self.malt_temperature,
            mode: self.mode,
            power: self.power,
            time_gmt: self.time_gmt,
            fermenter_beer_type: self.fermenter_beer_type,
            fermenter_temperature: self.fermenter_temperature,
            fermenter_gravity: self.fermenter_gravity,
            fermenter_total: self.fermenter_total,
            fermenter_time_remaining: self.fermenter_time_remaining,
            fermenter_progress: self.fermenter_progress,
            updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Blog posts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub image_url: Option<String>,
    /// Public listing and retrieval only see posts with `published = true`.
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPost {
    pub title: String,
    pub summary: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl NewBlogPost {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_owned());
        }
        Ok(())
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published: Option<bool>,
}

impl BlogPostPatch {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("title must not be empty".to_owned());
        }
        Ok(())
    }

    pub fn apply(self, post: &mut BlogPost, updated_at: DateTime<Utc>) {
        if let Some(v) = self.title {
            post.title = v;
        }
        if let Some(v) = self.summary {
            post.summary = v;
        }
        if let Some(v) = self.content {
            post.content = v;
        }
        if let Some(v) = self.image_url {
            post.image_url = Some(v);
        }
        if let Some(v) = self.published {
            post.published = v;
        }
        post.updated_at = updated_at;
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub id: String,
    pub total_batches: i32,
    pub liters_produced: i32,
    pub active_fermenters: i32,
    pub days_since_last_batch: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStats {
    pub total_batches: i32,
    pub liters_produced: i32,
    pub active_fermenters: i32,
    pub days_since_last_batch: i32,
}

impl NewStats {
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("totalBatches", self.total_batches),
            ("litersProduced", self.liters_produced),
            ("activeFermenters", self.active_fermenters),
            ("daysSinceLastBatch", self.days_since_last_batch),
        ];
        match fields.iter().find(|(_, v)| *v < 0) {
            Some((name, v)) => Err(format!("{name} must be non-negative, got {v}")),
            None => Ok(()),
        }
    }

    pub fn into_stats(self, id: String, updated_at: DateTime<Utc>) -> Stats {
        Stats {
            id,
            total_batches: self.total_batches,
            liters_produced: self.liters_produced,
            active_fermenters: self.active_fermenters,
            days_since_last_batch: self.days_since_last_batch,
            updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    /// bcrypt hash; never leaves the server.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading_body(progress: i32) -> NewBrewingReading {
        NewBrewingReading {
            kettle_temperature: 66.0,
            malt_temperature: 65.5,
            mode: "Mashing".to_owned(),
            power: 2500,
            time_gmt: "10:00:00".to_owned(),
            fermenter_beer_type: "Pilsner".to_owned(),
            fermenter_temperature: 11.0,
            fermenter_gravity: 1.048,
            fermenter_total: "20L".to_owned(),
            fermenter_time_remaining: "2 uker".to_owned(),
            fermenter_progress: progress,
        }
    }

    #[test]
    fn progress_bounds_are_inclusive() {
        assert!(reading_body(0).validate().is_ok());
        assert!(reading_body(100).validate().is_ok());
        assert!(reading_body(101).validate().is_err());
        assert!(reading_body(-1).validate().is_err());
    }

    #[test]
    fn reading_serializes_time_gmt_key() {
        let reading = reading_body(40).into_reading("r1".to_owned(), Utc::now());
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["timeGMT"], "10:00:00");
        assert_eq!(json["fermenterProgress"], 40);
        assert!(json.get("time_gmt").is_none());
    }

    #[test]
    fn new_blog_post_defaults_to_unpublished() {
        let post: NewBlogPost =
            serde_json::from_str(r#"{"title":"T","summary":"S","content":"C"}"#).unwrap();
        assert!(!post.published);
        assert!(post.image_url.is_none());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let created = Utc::now() - chrono::Duration::hours(1);
        let mut post = BlogPost {
            id: "p1".to_owned(),
            title: "Old".to_owned(),
            summary: "S".to_owned(),
            content: "C".to_owned(),
            image_url: None,
            published: false,
            created_at: created,
            updated_at: created,
        };
        let now = Utc::now();
        BlogPostPatch {
            title: Some("New".to_owned()),
            published: Some(true),
            ..Default::default()
        }
        .apply(&mut post, now);

        assert_eq!(post.title, "New");
        assert_eq!(post.summary, "S");
        assert!(post.published);
        assert_eq!(post.created_at, created);
        assert_eq!(post.updated_at, now);
    }

    #[test]
    fn negative_stats_rejected() {
        let stats = NewStats {
            total_batches: 3,
            liters_produced: -5,
            active_fermenters: 1,
            days_since_last_batch: 0,
        };
        let err = stats.validate().unwrap_err();
        assert!(err.contains("litersProduced"));
    }

    #[test]
    fn user_hash_is_not_serialized() {
        let user = User {
            id: "u1".to_owned(),
            username: "admin".to_owned(),
            password_hash: "$2b$hash".to_owned(),
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "admin");
    }
}
