//! SQLite store implementation
//!
//! One database file (`plan.db`) per store directory, guarded by an
//! exclusive advisory lock (`store.lock`) so two processes never write the
//! same store concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use log::{debug, info};
use rusqlite::{Connection, params};

use crate::error::StoreError;

/// Database file name inside a store directory.
pub const DB_FILE: &str = "plan.db";

/// Lock file name inside a store directory.
pub const LOCK_FILE: &str = "store.lock";

/// Planning row, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningRecord {
    pub id: String,
    pub scope: String,
    pub title: String,
    pub creator_id: String,
    pub creator_name: String,
    pub single_select: bool,
    pub status: String,
    pub created_at: i64,
    pub closed_at: Option<i64>,
}

/// Option row. `option_id` doubles as the display position (assigned 1..=N
/// at creation, never changed afterwards).
#[derive(Debug, Clone, PartialEq)]
pub struct OptionRecord {
    pub planning_id: String,
    pub option_id: u32,
    pub label: String,
}

/// Vote row. `rank` preserves the order of the option's voter roll.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteRecord {
    pub planning_id: String,
    pub option_id: u32,
    pub voter_id: String,
    pub voter_name: String,
    pub rank: u32,
}

/// One planning with all of its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlanning {
    pub planning: PlanningRecord,
    pub options: Vec<OptionRecord>,
    pub votes: Vec<VoteRecord>,
}

/// Row counts, for `planstore status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub plannings: usize,
    pub options: usize,
    pub votes: usize,
}

/// Handle to an open store. Cheap operations lock the connection briefly;
/// the advisory file lock is held for the lifetime of the handle.
pub struct Store {
    conn: Mutex<Connection>,
    dir: PathBuf,
    _lock: fs::File,
}

impl Store {
    /// Open (creating if necessary) the store in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let lock = fs::File::create(dir.join(LOCK_FILE))?;
        if lock.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked(dir.display().to_string()));
        }

        let db_path = dir.join(DB_FILE);
        let conn = Connection::open(&db_path).map_err(|source| StoreError::Open {
            path: db_path.display().to_string(),
            source,
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        create_schema(&conn)?;

        debug!("store opened at {}", dir.display());
        Ok(Self {
            conn: Mutex::new(conn),
            dir,
            _lock: lock,
        })
    }

    /// Create a fresh, empty store in `dir`. With `force`, an existing
    /// database is wiped first; without it, an existing database is kept
    /// as-is (schema creation is idempotent).
    pub fn init(dir: impl AsRef<Path>, force: bool) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let db_path = dir.join(DB_FILE);
        if force && db_path.exists() {
            info!("removing existing database at {}", db_path.display());
            fs::remove_file(&db_path)?;
        }
        Self::open(dir)
    }

    /// Directory this store lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one planning and all of its rows in a single transaction.
    ///
    /// Options and votes are replaced wholesale; the planning row is
    /// upserted. Returns only after the transaction is committed.
    pub fn save(&self, stored: &StoredPlanning) -> Result<(), StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO plannings
                (id, scope, title, creator_id, creator_name, single_select,
                 status, created_at, closed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                closed_at = excluded.closed_at",
            params![
                stored.planning.id,
                stored.planning.scope,
                stored.planning.title,
                stored.planning.creator_id,
                stored.planning.creator_name,
                stored.planning.single_select,
                stored.planning.status,
                stored.planning.created_at,
                stored.planning.closed_at,
            ],
        )?;

        tx.execute("DELETE FROM options WHERE planning_id = ?1", params![stored.planning.id])?;
        for opt in &stored.options {
            tx.execute(
                "INSERT INTO options (planning_id, option_id, label) VALUES (?1, ?2, ?3)",
                params![opt.planning_id, opt.option_id, opt.label],
            )?;
        }

        tx.execute("DELETE FROM votes WHERE planning_id = ?1", params![stored.planning.id])?;
        for vote in &stored.votes {
            tx.execute(
                "INSERT INTO votes (planning_id, option_id, voter_id, voter_name, rank)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![vote.planning_id, vote.option_id, vote.voter_id, vote.voter_name, vote.rank],
            )?;
        }

        tx.commit()?;
        debug!("saved planning {}", stored.planning.id);
        Ok(())
    }

    /// Load every planning with its options and votes. Plannings come back
    /// newest-first; options by id; votes by (option, rank).
    pub fn load_all(&self) -> Result<Vec<StoredPlanning>, StoreError> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, scope, title, creator_id, creator_name, single_select,
                    status, created_at, closed_at
             FROM plannings ORDER BY created_at DESC",
        )?;
        let plannings: Vec<PlanningRecord> = stmt
            .query_map([], |row| {
                Ok(PlanningRecord {
                    id: row.get(0)?,
                    scope: row.get(1)?,
                    title: row.get(2)?,
                    creator_id: row.get(3)?,
                    creator_name: row.get(4)?,
                    single_select: row.get(5)?,
                    status: row.get(6)?,
                    created_at: row.get(7)?,
                    closed_at: row.get(8)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        let mut opt_stmt = conn.prepare(
            "SELECT option_id, label FROM options WHERE planning_id = ?1 ORDER BY option_id",
        )?;
        let mut vote_stmt = conn.prepare(
            "SELECT option_id, voter_id, voter_name, rank
             FROM votes WHERE planning_id = ?1 ORDER BY option_id, rank",
        )?;

        let mut out = Vec::with_capacity(plannings.len());
        for planning in plannings {
            let options: Vec<OptionRecord> = opt_stmt
                .query_map(params![planning.id], |row| {
                    Ok(OptionRecord {
                        planning_id: planning.id.clone(),
                        option_id: row.get(0)?,
                        label: row.get(1)?,
                    })
                })?
                .collect::<Result<_, _>>()?;

            let votes: Vec<VoteRecord> = vote_stmt
                .query_map(params![planning.id], |row| {
                    Ok(VoteRecord {
                        planning_id: planning.id.clone(),
                        option_id: row.get(0)?,
                        voter_id: row.get(1)?,
                        voter_name: row.get(2)?,
                        rank: row.get(3)?,
                    })
                })?
                .collect::<Result<_, _>>()?;

            out.push(StoredPlanning {
                planning,
                options,
                votes,
            });
        }

        Ok(out)
    }

    /// Row counts across the whole store.
    pub fn counts(&self) -> Result<StoreCounts, StoreError> {
        let conn = self.lock_conn()?;
        let count = |table: &str| -> Result<usize, rusqlite::Error> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
        };
        Ok(StoreCounts {
            plannings: count("plannings")?,
            options: count("options")?,
            votes: count("votes")?,
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Corrupt("store mutex poisoned".to_string()))
    }
}

fn create_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS plannings (
            id            TEXT PRIMARY KEY,
            scope         TEXT NOT NULL,
            title         TEXT NOT NULL,
            creator_id    TEXT NOT NULL,
            creator_name  TEXT NOT NULL,
            single_select INTEGER NOT NULL,
            status        TEXT NOT NULL,
            created_at    INTEGER NOT NULL,
            closed_at     INTEGER
        );
        CREATE TABLE IF NOT EXISTS options (
            planning_id TEXT NOT NULL REFERENCES plannings(id) ON DELETE CASCADE,
            option_id   INTEGER NOT NULL,
            label       TEXT NOT NULL,
            PRIMARY KEY (planning_id, option_id)
        );
        CREATE TABLE IF NOT EXISTS votes (
            planning_id TEXT NOT NULL REFERENCES plannings(id) ON DELETE CASCADE,
            option_id   INTEGER NOT NULL,
            voter_id    TEXT NOT NULL,
            voter_name  TEXT NOT NULL,
            rank        INTEGER NOT NULL,
            PRIMARY KEY (planning_id, option_id, voter_id)
        );
        CREATE INDEX IF NOT EXISTS idx_plannings_scope ON plannings(scope);",
    )
}
