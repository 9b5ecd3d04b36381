use crate::Database;
use crate::models::{
    AdSlotRow, ArtworkRow, CategoryRow, CommentInsert, CommentRow, NewArtwork, UserRow,
};
use anyhow::Result;
use museum_types::models::Role;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

const USER_COLUMNS: &str = "id, username, password, is_premium, role, created_at";

const ARTWORK_COLUMNS: &str = "id, title, description, image_url, video_url, category_id, \
     is_premium, comments_enabled, display_order, aspect_ratio, views, created_at";

/// Per-user join tables whose rows are flipped on and off.
#[derive(Debug, Clone, Copy)]
enum PairTable {
    Likes,
    Bookmarks,
}

impl PairTable {
    fn name(self) -> &'static str {
        match self {
            Self::Likes => "likes",
            Self::Bookmarks => "bookmarks",
        }
    }
}

impl Database {
    // -- Users --

    /// Inserts a user. Returns `None` when the username is already taken.
    pub fn create_user(&self, username: &str, password_hash: &str, role: Role) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
                params![username, password_hash, role.as_str()],
            );
            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn set_user_premium(&self, id: i64, is_premium: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_premium = ?1 WHERE id = ?2",
                params![is_premium, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_user_role(&self, id: i64, role: Role) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                params![role.as_str(), id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Grants admin to every listed username that exists. Returns how many
    /// rows changed.
    pub fn promote_admins(&self, usernames: &[String]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let mut stmt =
                conn.prepare("UPDATE users SET role = 'admin' WHERE username = ?1 AND role != 'admin'")?;
            let mut promoted = 0;
            for username in usernames {
                promoted += stmt.execute([username])?;
            }
            if promoted > 0 {
                info!("Promoted {} user(s) to admin", promoted);
            }
            Ok(promoted)
        })
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, display_order FROM categories
                 ORDER BY display_order, id",
            )?;
            let rows = stmt
                .query_map([], category_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn create_category(&self, name: &str, description: &str, display_order: i64) -> Result<CategoryRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO categories (name, description, display_order) VALUES (?1, ?2, ?3)",
                params![name, description, display_order],
            )?;
            Ok(CategoryRow {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                description: description.to_string(),
                display_order,
            })
        })
    }

    pub fn category_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM categories WHERE id = ?1", [id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Artworks --

    pub fn insert_artwork(&self, artwork: &NewArtwork<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO artworks (title, description, image_url, video_url, category_id,
                     is_premium, comments_enabled, display_order, aspect_ratio)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    artwork.title,
                    artwork.description,
                    artwork.image_url,
                    artwork.video_url,
                    artwork.category_id,
                    artwork.is_premium,
                    artwork.comments_enabled,
                    artwork.display_order,
                    artwork.aspect_ratio,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_artwork(&self, id: i64) -> Result<Option<ArtworkRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {ARTWORK_COLUMNS} FROM artworks WHERE id = ?1"),
                    [id],
                    artwork_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Artworks in display order, then insertion order.
    pub fn list_artworks(&self, category_id: Option<i64>, limit: u32, offset: u32) -> Result<Vec<ArtworkRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ARTWORK_COLUMNS} FROM artworks
                 WHERE (?1 IS NULL OR category_id = ?1)
                 ORDER BY display_order, id
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(params![category_id, limit, offset], artwork_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_artwork_premium(&self, id: i64, is_premium: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE artworks SET is_premium = ?1 WHERE id = ?2",
                params![is_premium, id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Flips `comments_enabled`. Returns the new state, or `None` if the
    /// artwork does not exist.
    pub fn toggle_comments_enabled(&self, id: i64) -> Result<Option<bool>> {
        self.with_conn_mut(|conn| {
            let state = conn
                .query_row(
                    "UPDATE artworks SET comments_enabled = NOT comments_enabled
                     WHERE id = ?1 RETURNING comments_enabled",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(state)
        })
    }

    /// Adds one view. Returns the new count, or `None` if the artwork does
    /// not exist.
    pub fn increment_views(&self, id: i64) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let views = conn
                .query_row(
                    "UPDATE artworks SET views = views + 1 WHERE id = ?1 RETURNING views",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(views)
        })
    }

    // -- Likes & bookmarks --

    /// Toggle a like: removes if present, inserts if not.
    /// Returns true when the like is now active.
    pub fn toggle_like(&self, user_id: i64, artwork_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| toggle_pair(conn, PairTable::Likes, user_id, artwork_id))
    }

    pub fn toggle_bookmark(&self, user_id: i64, artwork_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| toggle_pair(conn, PairTable::Bookmarks, user_id, artwork_id))
    }

    pub fn has_liked(&self, user_id: i64, artwork_id: i64) -> Result<bool> {
        self.with_conn(|conn| pair_exists(conn, PairTable::Likes, user_id, artwork_id))
    }

    pub fn has_bookmarked(&self, user_id: i64, artwork_id: i64) -> Result<bool> {
        self.with_conn(|conn| pair_exists(conn, PairTable::Bookmarks, user_id, artwork_id))
    }

    // -- Comments --

    /// Inserts a comment only if the artwork exists and accepts comments,
    /// checked inside the same transaction as the insert.
    pub fn insert_comment(&self, artwork_id: i64, user_id: i64, content: &str) -> Result<CommentInsert> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let enabled: Option<bool> = tx
                .query_row(
                    "SELECT comments_enabled FROM artworks WHERE id = ?1",
                    [artwork_id],
                    |row| row.get(0),
                )
                .optional()?;

            match enabled {
                None => return Ok(CommentInsert::ArtworkMissing),
                Some(false) => return Ok(CommentInsert::CommentsDisabled),
                Some(true) => {}
            }

            tx.execute(
                "INSERT INTO comments (content, user_id, artwork_id) VALUES (?1, ?2, ?3)",
                params![content, user_id, artwork_id],
            )?;
            let id = tx.last_insert_rowid();
            let row = query_comment(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("Comment {} vanished after insert", id))?;

            tx.commit()?;
            Ok(CommentInsert::Created(row))
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    /// Comments for an artwork, oldest first.
    pub fn list_comments(&self, artwork_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch the author's username in a single query
            let mut stmt = conn.prepare(
                "SELECT c.id, c.content, c.user_id, u.username, c.artwork_id, c.created_at
                 FROM comments c
                 LEFT JOIN users u ON c.user_id = u.id
                 WHERE c.artwork_id = ?1
                 ORDER BY c.created_at, c.id",
            )?;
            let rows = stmt
                .query_map([artwork_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes a comment and its reports. Returns false if it did not exist.
    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM comment_reports WHERE comment_id = ?1", [id])?;
            let deleted = tx.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(deleted > 0)
        })
    }

    /// Records a report once per reporter. Returns the number of distinct
    /// reporters, or `None` if the comment does not exist. The existence
    /// check shares a transaction with the insert.
    pub fn report_comment(&self, comment_id: i64, reporter_id: i64) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            let exists = tx
                .query_row("SELECT 1 FROM comments WHERE id = ?1", [comment_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO comment_reports (comment_id, reporter_id) VALUES (?1, ?2)",
                params![comment_id, reporter_id],
            )?;
            if inserted == 0 {
                debug!("Duplicate report on comment {} by user {}", comment_id, reporter_id);
            }
            let reports = tx.query_row(
                "SELECT COUNT(*) FROM comment_reports WHERE comment_id = ?1",
                [comment_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok(Some(reports))
        })
    }

    // -- Ads --

    pub fn list_enabled_ad_slots(&self) -> Result<Vec<AdSlotRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT slot, image_url, link_url, enabled, updated_at FROM ad_slots
                 WHERE enabled = 1
                 ORDER BY slot",
            )?;
            let rows = stmt
                .query_map([], ad_slot_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn upsert_ad_slot(&self, slot: &str, image_url: &str, link_url: &str, enabled: bool) -> Result<AdSlotRow> {
        self.with_conn_mut(|conn| {
            let row = conn.query_row(
                "INSERT INTO ad_slots (slot, image_url, link_url, enabled) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(slot) DO UPDATE SET
                     image_url = excluded.image_url,
                     link_url = excluded.link_url,
                     enabled = excluded.enabled,
                     updated_at = datetime('now')
                 RETURNING slot, image_url, link_url, enabled, updated_at",
                params![slot, image_url, link_url, enabled],
                ad_slot_from_row,
            )?;
            Ok(row)
        })
    }
}

/// Single conditional insert-or-delete. The primary key on
/// (user_id, artwork_id) rejects a second insert.
fn toggle_pair(conn: &Connection, table: PairTable, user_id: i64, artwork_id: i64) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;

    let inserted = tx.execute(
        &format!("INSERT OR IGNORE INTO {} (user_id, artwork_id) VALUES (?1, ?2)", table.name()),
        params![user_id, artwork_id],
    )?;

    if inserted == 0 {
        tx.execute(
            &format!("DELETE FROM {} WHERE user_id = ?1 AND artwork_id = ?2", table.name()),
            params![user_id, artwork_id],
        )?;
    }

    tx.commit()?;
    Ok(inserted > 0)
}

fn pair_exists(conn: &Connection, table: PairTable, user_id: i64, artwork_id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE user_id = ?1 AND artwork_id = ?2", table.name()),
            params![user_id, artwork_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, predicate: &str, value: P) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}"))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                is_premium: row.get(3)?,
                role: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_comment(conn: &Connection, id: i64) -> Result<Option<CommentRow>> {
    let row = conn
        .query_row(
            "SELECT c.id, c.content, c.user_id, u.username, c.artwork_id, c.created_at
             FROM comments c
             LEFT JOIN users u ON c.user_id = u.id
             WHERE c.id = ?1",
            [id],
            comment_from_row,
        )
        .optional()?;
    Ok(row)
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        display_order: row.get(3)?,
    })
}

fn artwork_from_row(row: &Row<'_>) -> rusqlite::Result<ArtworkRow> {
    Ok(ArtworkRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image_url: row.get(3)?,
        video_url: row.get(4)?,
        category_id: row.get(5)?,
        is_premium: row.get(6)?,
        comments_enabled: row.get(7)?,
        display_order: row.get(8)?,
        aspect_ratio: row.get(9)?,
        views: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        content: row.get(1)?,
        user_id: row.get(2)?,
        username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        artwork_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn ad_slot_from_row(row: &Row<'_>) -> rusqlite::Result<AdSlotRow> {
    Ok(AdSlotRow {
        slot: row.get(0)?,
        image_url: row.get(1)?,
        link_url: row.get(2)?,
        enabled: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
