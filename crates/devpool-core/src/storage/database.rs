//! SQLite-based focus session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed focus sessions
//! - User profiles and their running focus score
//! - Key-value store for application state

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::session::SessionSummary;
use crate::store::{Role, UserProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSessionRecord {
    pub id: i64,
    pub user_id: String,
    pub duration_secs: u64,
    pub avg_focus_score: u8,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FocusStats {
    pub total_sessions: u64,
    pub total_focus_secs: u64,
    /// Rounded mean of per-session averages.
    pub average_focus_score: u8,
    pub best_focus_score: u8,
    pub today_sessions: u64,
    pub today_focus_secs: u64,
}

/// SQLite database standing in for the hosted record store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/devpool/devpool.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("devpool.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS focus_sessions (
                    id              INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id         TEXT NOT NULL,
                    duration_secs   INTEGER NOT NULL,
                    avg_focus_score INTEGER NOT NULL,
                    started_at      TEXT NOT NULL,
                    ended_at        TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS profiles (
                    id           TEXT PRIMARY KEY,
                    user_id      TEXT NOT NULL UNIQUE,
                    display_name TEXT NOT NULL,
                    role         TEXT NOT NULL,
                    focus_score  INTEGER NOT NULL DEFAULT 0,
                    skills       TEXT,
                    bio          TEXT,
                    created_at   TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_focus_sessions_user ON focus_sessions(user_id);
                CREATE INDEX IF NOT EXISTS idx_focus_sessions_ended_at ON focus_sessions(ended_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Focus sessions ───────────────────────────────────────────────

    /// Record a completed focus session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_focus_session(
        &self,
        user_id: &str,
        summary: &SessionSummary,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO focus_sessions (user_id, duration_secs, avg_focus_score, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                summary.duration_secs,
                summary.average_focus_score,
                summary.started_at.to_rfc3339(),
                summary.ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    pub fn list_focus_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<FocusSessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, duration_secs, avg_focus_score, started_at, ended_at
             FROM focus_sessions
             WHERE user_id = ?1
             ORDER BY ended_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok(FocusSessionRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                duration_secs: row.get(2)?,
                avg_focus_score: row.get(3)?,
                started_at: parse_ts(&row.get::<_, String>(4)?),
                ended_at: parse_ts(&row.get::<_, String>(5)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn focus_stats(&self, user_id: &str) -> Result<FocusStats, DatabaseError> {
        let (total_sessions, total_focus_secs, avg, best) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0),
                    COALESCE(AVG(avg_focus_score), 0), COALESCE(MAX(avg_focus_score), 0)
             FROM focus_sessions
             WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, u8>(3)?,
                ))
            },
        )?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_sessions, today_focus_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM focus_sessions
             WHERE user_id = ?1 AND ended_at >= ?2",
            params![user_id, format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;

        Ok(FocusStats {
            total_sessions,
            total_focus_secs,
            average_focus_score: avg.round().clamp(0.0, 100.0) as u8,
            best_focus_score: best,
            today_sessions,
            today_focus_secs,
        })
    }

    // ── Profiles ─────────────────────────────────────────────────────

    /// Insert or replace the profile keyed by `user_id`.
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO profiles (id, user_id, display_name, role, focus_score, skills, bio, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                role = excluded.role,
                focus_score = excluded.focus_score,
                skills = excluded.skills,
                bio = excluded.bio",
            params![
                profile.id,
                profile.user_id,
                profile.display_name,
                profile.role.as_str(),
                profile.focus_score,
                profile.skills,
                profile.bio,
                profile.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, user_id, display_name, role, focus_score, skills, bio, created_at
                 FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let role: String = row.get(3)?;
                    Ok(UserProfile {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        display_name: row.get(2)?,
                        role: role.parse().unwrap_or(Role::Learner),
                        focus_score: row.get(4)?,
                        skills: row.get(5)?,
                        bio: row.get(6)?,
                        created_at: parse_ts(&row.get::<_, String>(7)?),
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    /// Overwrite the stored focus score.
    ///
    /// # Errors
    /// Returns `ProfileNotFound` when no profile exists for `user_id`.
    pub fn set_focus_score(&self, user_id: &str, score: u8) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE profiles SET focus_score = ?1 WHERE user_id = ?2",
            params![score.min(100), user_id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::ProfileNotFound(user_id.to_string()));
        }
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn summary(duration_secs: u64, score: u8) -> SessionSummary {
        let ended_at = Utc::now();
        SessionSummary {
            duration_secs,
            average_focus_score: score,
            sample_count: 5,
            started_at: ended_at - Duration::seconds(duration_secs as i64),
            ended_at,
        }
    }

    #[test]
    fn record_and_list() {
        let db = Database::open_memory().unwrap();
        db.record_focus_session("u1", &summary(300, 80)).unwrap();
        db.record_focus_session("u1", &summary(600, 90)).unwrap();
        db.record_focus_session("u2", &summary(60, 10)).unwrap();

        let sessions = db.list_focus_sessions("u1", 10).unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.user_id == "u1"));
        assert_eq!(db.list_focus_sessions("u1", 1).unwrap().len(), 1);
    }

    #[test]
    fn stats_aggregate_per_user() {
        let db = Database::open_memory().unwrap();
        db.record_focus_session("u1", &summary(300, 80)).unwrap();
        db.record_focus_session("u1", &summary(600, 91)).unwrap();
        let stats = db.focus_stats("u1").unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_focus_secs, 900);
        assert_eq!(stats.average_focus_score, 86);
        assert_eq!(stats.best_focus_score, 91);
        assert_eq!(stats.today_sessions, 2);
    }

    #[test]
    fn stats_for_unknown_user_are_zero() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.focus_stats("nobody").unwrap(), FocusStats::default());
    }

    #[test]
    fn profile_upsert_and_score_update() {
        let db = Database::open_memory().unwrap();
        let mut profile = UserProfile::new("u1", "Ada", Role::Learner);
        profile.focus_score = 80;
        db.upsert_profile(&profile).unwrap();

        db.set_focus_score("u1", 86).unwrap();
        let stored = db.get_profile("u1").unwrap().unwrap();
        assert_eq!(stored.focus_score, 86);
        assert_eq!(stored.role, Role::Learner);
        assert_eq!(stored.id, profile.id);

        profile.display_name = "Ada L.".into();
        profile.focus_score = 50;
        db.upsert_profile(&profile).unwrap();
        let stored = db.get_profile("u1").unwrap().unwrap();
        assert_eq!(stored.display_name, "Ada L.");
        assert_eq!(stored.focus_score, 50);
    }

    #[test]
    fn score_update_without_profile_fails() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(
            db.set_focus_score("ghost", 10),
            Err(DatabaseError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }
}
