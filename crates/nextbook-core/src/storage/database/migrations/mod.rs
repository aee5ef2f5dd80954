mod v1_initial;

use chrono::Utc;
use rusqlite::{Connection, params};

use crate::error::Result;

pub trait Migration {
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up(&self, conn: &Connection) -> Result<()>;
}

fn all_migrations() -> Vec<Box<dyn Migration>> {
    vec![Box::new(v1_initial::V1Initial)]
}

fn has_migrations_table(conn: &Connection) -> Result<bool> {
    let exists = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='schema_migrations'")?
        .exists([])?;
    Ok(exists)
}

fn is_migration_applied(conn: &Connection, version: u32) -> Result<bool> {
    if !has_migrations_table(conn)? {
        return Ok(false);
    }

    let applied = conn
        .prepare("SELECT 1 FROM schema_migrations WHERE version = ?1")?
        .exists(params![version])?;
    Ok(applied)
}

/// Apply every migration not yet recorded in `schema_migrations`, in version order.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    for migration in all_migrations() {
        if is_migration_applied(conn, migration.version())? {
            continue;
        }
        migration.up(conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
            params![migration.version(), Utc::now().to_rfc3339()],
        )?;
    }

    Ok(())
}

pub fn get_applied_versions(conn: &Connection) -> Result<Vec<u32>> {
    if !has_migrations_table(conn)? {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<u32>, _>>()?;
    Ok(versions)
}
