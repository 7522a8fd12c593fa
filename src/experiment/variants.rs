//! Experiment variant assignment and persistence
//!
//! Each learner is bucketed once into the auto-join experiment. The
//! assignment store is an explicit dependency so tests can substitute
//! an in-memory store and a fixed random source; production uses the
//! SQLite store under the local data directory. Assignments are scoped
//! to the client installation and are not synchronized across devices.

use anyhow::Result;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::model::Variant;

/// Per-user variant persistence, local to the client context
pub trait VariantStore: Send + Sync {
    fn get_variant(&self, user_id: &str) -> Result<Option<Variant>>;
    fn set_variant(&self, user_id: &str, variant: Variant) -> Result<()>;
}

/// Return the persisted variant for the user, assigning one uniformly
/// at random on first call. Idempotent: repeated calls return the same
/// variant until the store is cleared externally.
pub fn assign_variant(store: &dyn VariantStore, user_id: &str) -> Result<Variant> {
    assign_variant_with(store, user_id, &mut rand::thread_rng())
}

/// RNG-injected variant of `assign_variant` for deterministic tests
pub fn assign_variant_with<R: Rng>(
    store: &dyn VariantStore,
    user_id: &str,
    rng: &mut R,
) -> Result<Variant> {
    if let Some(existing) = store.get_variant(user_id)? {
        debug!("User {} already assigned variant {}", user_id, existing.as_str());
        return Ok(existing);
    }

    let variant = if rng.gen_bool(0.5) {
        Variant::AutoJoin
    } else {
        Variant::Prompted
    };
    store.set_variant(user_id, variant)?;
    info!("Assigned user {} to experiment variant {}", user_id, variant.as_str());
    Ok(variant)
}

/// Variant store backed by SQLite
pub struct SqliteVariantStore {
    conn: Mutex<Connection>,
}

impl SqliteVariantStore {
    /// Open or create a variant store at the given database path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS experiment_variants (
                user_id TEXT PRIMARY KEY,
                variant TEXT NOT NULL,
                assigned_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Number of assigned users (for status reporting)
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM experiment_variants", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}

impl VariantStore for SqliteVariantStore {
    fn get_variant(&self, user_id: &str) -> Result<Option<Variant>> {
        let conn = self.conn.lock().unwrap();
        let stored: Option<String> = conn
            .query_row(
                "SELECT variant FROM experiment_variants WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        // An unrecognized stored value is treated as unassigned rather
        // than failing the matching request
        Ok(stored.as_deref().and_then(Variant::parse))
    }

    fn set_variant(&self, user_id: &str, variant: Variant) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO experiment_variants (user_id, variant) VALUES (?1, ?2)",
            params![user_id, variant.as_str()],
        )?;
        Ok(())
    }
}
