//! Database row types: these map directly to SQLite rows.
//! Distinct from museum-types API models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use museum_types::models::{AdSlot, Artwork, Category, Comment, Role, User};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub is_premium: bool,
    pub role: String,
    pub created_at: String,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub display_order: i64,
}

pub struct ArtworkRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub video_url: Option<String>,
    pub category_id: i64,
    pub is_premium: bool,
    pub comments_enabled: bool,
    pub display_order: i64,
    pub aspect_ratio: f64,
    pub views: i64,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub username: String,
    pub artwork_id: i64,
    pub created_at: String,
}

pub struct AdSlotRow {
    pub slot: String,
    pub image_url: String,
    pub link_url: String,
    pub enabled: bool,
    pub updated_at: String,
}

/// Insert payload for a new artwork; defaults are resolved by the caller.
pub struct NewArtwork<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub image_url: &'a str,
    pub video_url: Option<&'a str>,
    pub category_id: i64,
    pub is_premium: bool,
    pub comments_enabled: bool,
    pub display_order: i64,
    pub aspect_ratio: f64,
}

/// Result of a conditional comment insert.
pub enum CommentInsert {
    Created(CommentRow),
    ArtworkMissing,
    CommentsDisabled,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
pub(crate) fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, what, e);
            DateTime::default()
        })
}

impl UserRow {
    pub fn into_user(self) -> User {
        let role = self.role.parse::<Role>().unwrap_or_else(|e| {
            warn!("Corrupt role on user {}: {}", self.id, e);
            Role::User
        });
        User {
            id: self.id,
            created_at: parse_timestamp(&self.created_at, &format!("user {}", self.id)),
            username: self.username,
            is_premium: self.is_premium,
            role,
        }
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            display_order: row.display_order,
        }
    }
}

impl From<ArtworkRow> for Artwork {
    fn from(row: ArtworkRow) -> Self {
        Self {
            created_at: parse_timestamp(&row.created_at, &format!("artwork {}", row.id)),
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            video_url: row.video_url,
            category_id: row.category_id,
            is_premium: row.is_premium,
            comments_enabled: row.comments_enabled,
            display_order: row.display_order,
            aspect_ratio: row.aspect_ratio,
            views: row.views,
            locked: false,
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            created_at: parse_timestamp(&row.created_at, &format!("comment {}", row.id)),
            id: row.id,
            content: row.content,
            user_id: row.user_id,
            username: row.username,
            artwork_id: row.artwork_id,
        }
    }
}

impl From<AdSlotRow> for AdSlot {
    fn from(row: AdSlotRow) -> Self {
        Self {
            updated_at: parse_timestamp(&row.updated_at, &format!("ad slot '{}'", row.slot)),
            slot: row.slot,
            image_url: row.image_url,
            link_url: row.link_url,
            enabled: row.enabled,
        }
    }
}
