//! Platform actions queued for the platform adapter to carry out.

use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Db;
use crate::error::AppError;
use crate::platform::{Platform, PlatformAction, PlatformError};

const MAX_BATCH: i64 = 200;

#[derive(Debug, Serialize)]
pub struct OutboxEntry {
    pub seq: i64,
    pub action_id: String,
    pub kind: String,
    pub action: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct OutboxQuery {
    pub after: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AckRequest {
    pub up_to: i64,
}

#[derive(Debug, Serialize)]
pub struct AckResult {
    pub acknowledged: usize,
}

/// [`Platform`] that records actions durably instead of calling out.
///
/// Each action gets a unique `action_id` the adapter can use to drop
/// redeliveries.
pub struct OutboxPlatform {
    db: Arc<Db>,
}

impl OutboxPlatform {
    pub fn new(db: Arc<Db>) -> Self {
        OutboxPlatform { db }
    }
}

impl Platform for OutboxPlatform {
    fn perform(&self, action: PlatformAction) -> Result<(), PlatformError> {
        let payload =
            serde_json::to_string(&action).map_err(|e| PlatformError::Api(e.to_string()))?;
        let action_id = Uuid::new_v4().to_string();
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO platform_actions (action_id, kind, payload) VALUES (?1, ?2, ?3)",
                    params![action_id, action.kind(), payload],
                )
            })
            .map_err(|e| PlatformError::Api(e.to_string()))?;
        tracing::debug!(kind = action.kind(), %action_id, "platform action queued");
        Ok(())
    }
}

pub fn pending(db: &Db, after: Option<i64>, limit: Option<i64>) -> Result<Vec<OutboxEntry>, AppError> {
    let after = after.unwrap_or(0);
    let limit = limit.unwrap_or(50).clamp(1, MAX_BATCH);

    let rows: Vec<(i64, String, String, String, String)> = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT seq, action_id, kind, payload, created_at
             FROM platform_actions WHERE seq > ?1 ORDER BY seq ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![after, limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        rows.collect::<Result<Vec<_>, rusqlite::Error>>()
    })?;

    let mut entries = Vec::with_capacity(rows.len());
    for (seq, action_id, kind, payload, created_at) in rows {
        entries.push(OutboxEntry {
            seq,
            action_id,
            kind,
            action: serde_json::from_str(&payload)?,
            created_at,
        });
    }
    Ok(entries)
}

/// Drops every action up to and including `up_to`.
pub fn acknowledge(db: &Db, up_to: i64) -> Result<AckResult, AppError> {
    let acknowledged = db.with_tx(|tx| {
        tx.execute("DELETE FROM platform_actions WHERE seq <= ?1", params![up_to])
    })?;
    Ok(AckResult { acknowledged })
}
