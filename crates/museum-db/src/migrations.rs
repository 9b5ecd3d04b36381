use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                is_premium  INTEGER NOT NULL DEFAULT 0,
                role        TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE categories (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                name           TEXT NOT NULL,
                description    TEXT NOT NULL DEFAULT '',
                display_order  INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE artworks (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                title             TEXT NOT NULL,
                description       TEXT NOT NULL,
                image_url         TEXT NOT NULL,
                video_url         TEXT,
                category_id       INTEGER NOT NULL REFERENCES categories(id),
                is_premium        INTEGER NOT NULL DEFAULT 0,
                comments_enabled  INTEGER NOT NULL DEFAULT 1,
                display_order     INTEGER NOT NULL DEFAULT 0,
                aspect_ratio      REAL NOT NULL DEFAULT 1.0,
                views             INTEGER NOT NULL DEFAULT 0,
                created_at        TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_artworks_category
                ON artworks(category_id, display_order);

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                content     TEXT NOT NULL,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                artwork_id  INTEGER NOT NULL REFERENCES artworks(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_comments_artwork
                ON comments(artwork_id, created_at);

            CREATE TABLE likes (
                user_id     INTEGER NOT NULL REFERENCES users(id),
                artwork_id  INTEGER NOT NULL REFERENCES artworks(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, artwork_id)
            );

            CREATE TABLE bookmarks (
                user_id     INTEGER NOT NULL REFERENCES users(id),
                artwork_id  INTEGER NOT NULL REFERENCES artworks(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, artwork_id)
            );

            CREATE TABLE comment_reports (
                comment_id   INTEGER NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
                reporter_id  INTEGER NOT NULL REFERENCES users(id),
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (comment_id, reporter_id)
            );

            CREATE TABLE ad_slots (
                slot        TEXT PRIMARY KEY,
                image_url   TEXT NOT NULL,
                link_url    TEXT NOT NULL,
                enabled     INTEGER NOT NULL DEFAULT 1,
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Seed the default collection
            INSERT INTO categories (name, description, display_order) VALUES
                ('Painting', 'Oil, acrylic and watercolour works', 1),
                ('Sculpture', 'Three-dimensional works in stone, metal and clay', 2),
                ('Photography', 'Film and digital photography', 3),
                ('Digital Art', 'Illustration, animation and generative pieces', 4);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
